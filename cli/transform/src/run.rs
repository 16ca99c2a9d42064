//! Main execution logic for kvx-transform.

use crate::args::Cli;
use crate::codec::Codec;
use anyhow::{Context, Result};
use kvx_transform::{ErrorPolicy, PipelineConfig};
use kvx_types::Message;
use kvx_worker::{Pipeline, StatsSnapshot};
use std::io::{BufRead, BufWriter, Write};
use tracing::{debug, info, warn};

/// Counts reported after a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Non-empty lines read
    pub lines_read: u64,
    /// Lines that were not valid envelopes
    pub decode_errors: u64,
    /// Lines written to the output
    pub lines_written: u64,
    /// Pipeline counters
    pub stats: StatsSnapshot,
}

/// Position of one input line in a batch.
enum Slot {
    /// Next decoded message in the batch
    Decoded,
    /// Undecodable line echoed back under the passthrough policy
    Raw(String),
}

#[derive(Default)]
struct Batch {
    slots: Vec<Slot>,
    messages: Vec<Message>,
}

impl Batch {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn push_message(&mut self, message: Message) {
        self.slots.push(Slot::Decoded);
        self.messages.push(message);
    }

    fn push_raw(&mut self, line: String) {
        self.slots.push(Slot::Raw(line));
    }

    /// Processes the batch and writes its output in input order.
    fn flush<W: Write>(
        &mut self,
        pipeline: &Pipeline,
        codec: &Codec,
        output: &mut W,
        pretty: bool,
    ) -> Result<u64> {
        let outcomes = pipeline
            .process_batch(std::mem::take(&mut self.messages))
            .context("Pipeline failed")?;
        let mut outcomes = outcomes.into_iter();
        let mut written = 0;

        for slot in self.slots.drain(..) {
            let line = match slot {
                Slot::Raw(line) => line,
                Slot::Decoded => {
                    let Some(message) = outcomes.next().and_then(|o| o.into_message()) else {
                        continue;
                    };
                    codec.encode(&message, pretty)?
                }
            };
            writeln!(output, "{line}")?;
            written += 1;
        }
        Ok(written)
    }
}

/// Run against stdin and stdout.
pub fn execute(args: &Cli) -> Result<RunSummary> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run(args, stdin.lock(), BufWriter::new(stdout.lock()))
}

/// Run the configured pipeline over NDJSON `input`, writing to `output`.
pub fn run<R: BufRead, W: Write>(args: &Cli, input: R, mut output: W) -> Result<RunSummary> {
    let config = PipelineConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
    let pipeline =
        Pipeline::from_config(&config, args.threads).context("Failed to build pipeline")?;
    info!(
        steps = ?pipeline.chain().step_names(),
        threads = args.threads,
        error_policy = ?config.error_policy,
        "Pipeline ready"
    );

    let mut codec = Codec::new();
    let mut batch = Batch::default();
    let mut lines_read = 0;
    let mut decode_errors = 0;
    let mut lines_written = 0;

    for (i, line) in input.lines().enumerate() {
        if args.limit.is_some_and(|limit| i >= limit) {
            break;
        }

        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        lines_read += 1;

        match codec.decode_line(&line) {
            Ok(message) => batch.push_message(message),
            Err(e) => {
                decode_errors += 1;
                match config.error_policy {
                    ErrorPolicy::Drop => warn!(line = i + 1, error = %e, "Invalid line, dropping"),
                    ErrorPolicy::Fail => {
                        return Err(e.context(format!("Failed to decode line {}", i + 1)))
                    }
                    ErrorPolicy::Passthrough => {
                        debug!(line = i + 1, error = %e, "Invalid line, passing through");
                        batch.push_raw(line);
                    }
                }
            }
        }

        if batch.len() >= args.batch_size {
            lines_written += batch.flush(&pipeline, &codec, &mut output, args.pretty)?;
        }
    }

    lines_written += batch.flush(&pipeline, &codec, &mut output, args.pretty)?;
    output.flush()?;
    pipeline.stats().complete();
    debug!(schemas = codec.interner().len(), "Input schemas interned");

    Ok(RunSummary {
        lines_read,
        decode_errors,
        lines_written,
        stats: pipeline.stats().snapshot(),
    })
}
