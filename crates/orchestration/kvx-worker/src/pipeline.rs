//! Message processing pipeline.

use crate::config::WorkerConfig;
use crate::stats::PipelineStats;
use kvx_error::{classify_error, ErrorCategory, KvxError, Result, TransformError};
use kvx_traits::{TransformChain, TransformStep};
use kvx_transform::{ErrorPolicy, PipelineConfig};
use kvx_types::{Message, TransformContext};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What became of one input message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every step completed.
    Processed {
        message: Message,
        key_modified: bool,
        value_modified: bool,
    },

    /// A step failed and the original message is emitted unchanged.
    PassedThrough(Message),

    /// A step failed and the message is not emitted.
    Dropped,
}

impl Outcome {
    /// Returns the message to emit, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Outcome::Processed { message, .. } | Outcome::PassedThrough(message) => Some(message),
            Outcome::Dropped => None,
        }
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Outcome::Processed { message, .. } | Outcome::PassedThrough(message) => Some(message),
            Outcome::Dropped => None,
        }
    }

    /// Returns true if a step replaced either side.
    pub fn is_modified(&self) -> bool {
        matches!(
            self,
            Outcome::Processed { key_modified, value_modified, .. } if *key_modified || *value_modified
        )
    }
}

/// A step chain plus the policy applied when it fails on a message.
///
/// One pipeline is shared by all worker threads; the steps' schema caches
/// are therefore shared too.
pub struct Pipeline {
    chain: TransformChain,
    config: WorkerConfig,
    stats: Arc<PipelineStats>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.chain.step_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline around an already built chain.
    pub fn new(chain: TransformChain, config: WorkerConfig) -> Self {
        debug!(
            steps = ?chain.step_names(),
            thread_count = config.thread_count,
            error_policy = ?config.error_policy,
            "Created pipeline"
        );
        Self {
            chain,
            config,
            stats: Arc::new(PipelineStats::new()),
        }
    }

    /// Builds the chain described by `config`, taking its error policy.
    pub fn from_config(config: &PipelineConfig, thread_count: usize) -> Result<Self> {
        let worker_config = WorkerConfig::new()
            .with_thread_count(thread_count)
            .with_error_policy(config.error_policy);
        worker_config.validate().map_err(KvxError::Config)?;
        Ok(Self::new(config.build_chain()?, worker_config))
    }

    pub fn chain(&self) -> &TransformChain {
        &self.chain
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Runs the chain over one message.
    ///
    /// # Errors
    ///
    /// Returns the step error only under [`ErrorPolicy::Fail`]; the other
    /// policies turn a failure into [`Outcome::Dropped`] or
    /// [`Outcome::PassedThrough`].
    pub fn process(&self, message: Message) -> Result<Outcome> {
        let original = match self.config.error_policy {
            ErrorPolicy::Passthrough => Some(message.clone()),
            ErrorPolicy::Drop | ErrorPolicy::Fail => None,
        };

        let mut context = TransformContext::from_message(message);
        match self.chain.process(&mut context) {
            Ok(()) => {
                let key_modified = context.key_modified();
                let value_modified = context.value_modified();
                self.stats.record_processed(key_modified || value_modified);
                trace!(key_modified, value_modified, "Message processed");
                Ok(Outcome::Processed {
                    message: context.into_message(),
                    key_modified,
                    value_modified,
                })
            }
            Err(e) => self.handle_error(e, original),
        }
    }

    fn handle_error(&self, error: KvxError, original: Option<Message>) -> Result<Outcome> {
        let category = classify_error(&error);
        match category {
            ErrorCategory::Permanent => self.stats.record_permanent_error(),
            ErrorCategory::Internal => self.stats.record_internal_error(),
        }

        match (self.config.error_policy, original) {
            (ErrorPolicy::Passthrough, Some(message)) => {
                debug!(error = %error, ?category, "Step failed, passing through original");
                self.stats.record_passed_through();
                Ok(Outcome::PassedThrough(message))
            }
            (ErrorPolicy::Fail, _) => {
                self.stats.record_failed();
                Err(error)
            }
            _ => {
                warn!(error = %error, ?category, "Step failed, dropping message");
                self.stats.record_dropped();
                Ok(Outcome::Dropped)
            }
        }
    }

    /// Processes `messages` across the configured number of threads.
    ///
    /// Messages are split into contiguous runs, one per thread, and outcomes
    /// are returned in input order.
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::Fail`], returns the error of the earliest failing
    /// message in input order.
    pub fn process_batch(&self, messages: Vec<Message>) -> Result<Vec<Outcome>> {
        let threads = self.config.thread_count.max(1);
        if threads == 1 || messages.len() < 2 {
            return messages.into_iter().map(|m| self.process(m)).collect();
        }

        let chunk_size = messages.len().div_ceil(threads);
        let mut remaining = messages.into_iter();
        let mut chunks = Vec::with_capacity(threads);
        loop {
            let chunk: Vec<Message> = remaining.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            chunks.push(chunk);
        }
        trace!(chunks = chunks.len(), chunk_size, "Dispatching batch");

        let per_chunk = std::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .into_iter()
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .into_iter()
                            .map(|m| self.process(m))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().map_err(|_| {
                        KvxError::Transform(TransformError::Internal(
                            "worker thread panicked".to_string(),
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        per_chunk.into_iter().flatten().collect()
    }
}
