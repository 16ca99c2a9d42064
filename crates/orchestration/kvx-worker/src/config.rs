//! Configuration types for the batch driver.

use kvx_transform::ErrorPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Pipeline`](crate::Pipeline) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of processing threads
    pub thread_count: usize,

    /// What to do with a message a step fails on
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_count: num_cpus(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of processing threads.
    pub fn with_thread_count(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_count == 0 {
            return Err("thread_count must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Get the number of available CPUs.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
