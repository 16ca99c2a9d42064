//! kvx-transform CLI
//!
//! Applies a key/value step pipeline to NDJSON messages read from stdin.
//!
//! # Usage
//!
//! ```bash
//! # Drop a field from every value record
//! cat messages.ndjson | kvx-transform --config drop.json
//!
//! # Merge key into value, then keep only the value
//! cat messages.ndjson | kvx-transform -c merge-unwrap.json --stats
//! ```

use clap::Parser;
use kvx_cli_common::{format_number, format_rate, init_logging};

mod args;
mod codec;
mod run;

use args::Cli;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr, so stdout carries only messages
    init_logging(args.log_level)?;

    let summary = run::execute(&args)?;

    if args.stats {
        let stats = &summary.stats;
        eprintln!();
        eprintln!("Statistics:");
        eprintln!("  Lines read:          {}", format_number(summary.lines_read));
        eprintln!("  Lines written:       {}", format_number(summary.lines_written));
        eprintln!("  Invalid lines:       {}", format_number(summary.decode_errors));
        eprintln!("  Messages processed:  {}", format_number(stats.messages_processed));
        eprintln!("  Messages modified:   {}", format_number(stats.messages_modified));
        eprintln!("  Messages dropped:    {}", format_number(stats.messages_dropped));
        eprintln!("  Passed through:      {}", format_number(stats.messages_passed_through));

        if stats.permanent_errors > 0 || stats.internal_errors > 0 {
            eprintln!(
                "  Errors:              {} permanent, {} internal",
                stats.permanent_errors, stats.internal_errors
            );
        }

        if let Some(duration) = stats.duration() {
            let secs = duration.num_milliseconds() as f64 / 1000.0;
            eprintln!("  Duration:            {secs:.2}s");
            eprintln!("  Throughput:          {}", format_rate(stats.messages_total(), secs));
        }
    }

    Ok(())
}
