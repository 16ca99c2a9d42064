//! Statistics for pipeline runs.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache line size on most modern CPUs (64 bytes).
const CACHE_LINE_SIZE: usize = 64;

/// An atomic counter alone on its cache line.
///
/// Worker threads bump different counters concurrently; padding keeps them
/// from contending on a shared line.
#[repr(C, align(64))]
#[derive(Debug)]
struct PaddedAtomicU64 {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
}

impl Default for PaddedAtomicU64 {
    fn default() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
        }
    }
}

impl PaddedAtomicU64 {
    #[inline]
    fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }
}

/// Counters collected while messages flow through a pipeline.
///
/// Safe to update from every worker thread at once.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// When processing started
    started_at: Option<DateTime<Utc>>,

    /// When processing completed
    completed_at: Mutex<Option<DateTime<Utc>>>,

    /// Messages the steps completed on
    messages_processed: PaddedAtomicU64,

    /// Processed messages with at least one side replaced
    messages_modified: PaddedAtomicU64,

    /// Failed messages dropped from the output
    messages_dropped: PaddedAtomicU64,

    /// Failed messages emitted unchanged
    messages_passed_through: PaddedAtomicU64,

    /// Failed messages that stopped the run
    messages_failed: PaddedAtomicU64,

    /// Failures the message itself caused
    permanent_errors: PaddedAtomicU64,

    /// Failures pointing at a bug or misconfiguration
    internal_errors: PaddedAtomicU64,
}

impl PipelineStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark processing as complete with the current time.
    pub fn complete(&self) {
        *self.completed_at.lock() = Some(Utc::now());
    }

    pub fn record_processed(&self, modified: bool) {
        self.messages_processed.increment();
        if modified {
            self.messages_modified.increment();
        }
    }

    pub fn record_dropped(&self) {
        self.messages_dropped.increment();
    }

    pub fn record_passed_through(&self) {
        self.messages_passed_through.increment();
    }

    pub fn record_failed(&self) {
        self.messages_failed.increment();
    }

    pub fn record_permanent_error(&self) {
        self.permanent_errors.increment();
    }

    pub fn record_internal_error(&self) {
        self.internal_errors.increment();
    }

    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load()
    }

    pub fn messages_modified(&self) -> u64 {
        self.messages_modified.load()
    }

    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load()
    }

    pub fn messages_passed_through(&self) -> u64 {
        self.messages_passed_through.load()
    }

    pub fn messages_failed(&self) -> u64 {
        self.messages_failed.load()
    }

    pub fn permanent_errors(&self) -> u64 {
        self.permanent_errors.load()
    }

    pub fn internal_errors(&self) -> u64 {
        self.internal_errors.load()
    }

    /// Get the duration of the run so far, or of the whole run once complete.
    pub fn duration(&self) -> Option<Duration> {
        let completed = *self.completed_at.lock();
        match (self.started_at, completed) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) => Some(Utc::now() - start),
            _ => None,
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: *self.completed_at.lock(),
            messages_processed: self.messages_processed(),
            messages_modified: self.messages_modified(),
            messages_dropped: self.messages_dropped(),
            messages_passed_through: self.messages_passed_through(),
            messages_failed: self.messages_failed(),
            permanent_errors: self.permanent_errors(),
            internal_errors: self.internal_errors(),
        }
    }
}

/// A serializable snapshot of pipeline statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub messages_processed: u64,
    pub messages_modified: u64,
    pub messages_dropped: u64,
    pub messages_passed_through: u64,
    pub messages_failed: u64,
    pub permanent_errors: u64,
    pub internal_errors: u64,
}

impl StatsSnapshot {
    /// Get the total duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Total messages seen, whatever their outcome.
    pub fn messages_total(&self) -> u64 {
        self.messages_processed
            + self.messages_dropped
            + self.messages_passed_through
            + self.messages_failed
    }
}
