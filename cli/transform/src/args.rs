//! CLI argument definitions for kvx-transform.

use clap::Parser;
pub use kvx_cli_common::LogLevel;
use std::path::PathBuf;

/// Apply a key/value step pipeline to NDJSON messages.
///
/// Reads one envelope per line from stdin:
///   {"message_key": "...", "key": {...}, "value": {...}}
/// and writes the transformed envelopes to stdout.
///
/// ## Examples
///
/// Drop a field from every value:
///   echo '{"value": {"id": 1, "password": "x"}}' | kvx-transform -c drop.json
///
/// With statistics and debug logging:
///   kvx-transform -c pipeline.json --stats -l debug < messages.ndjson
#[derive(Parser, Debug)]
#[command(name = "kvx-transform")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(short = 'c', long, env = "KVX_CONFIG")]
    pub config: PathBuf,

    /// Number of processing threads (must be >= 1)
    #[arg(short = 't', long, default_value_t = num_cpus(), value_parser = parse_positive_usize)]
    pub threads: usize,

    /// Messages read before each batch is processed (must be >= 1)
    #[arg(long, default_value = "1024", value_parser = parse_positive_usize)]
    pub batch_size: usize,

    /// Process only the first N lines
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print pipeline statistics to stderr
    #[arg(long)]
    pub stats: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

/// Get the number of available CPUs.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value < 1 {
        return Err(format!("{value} is not in 1.."));
    }
    Ok(value)
}
