//! Counters describing what the fetcher has done so far.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomic counters tracking fetch attempts and backoff.
#[derive(Debug, Default)]
pub struct FetchTracker {
    attempts: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    /// Cumulative backoff time in milliseconds.
    total_backoff_ms: AtomicU64,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backoff(&self, duration: Duration) {
        self.total_backoff_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            attempts: self.attempts.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            total_backoff: Duration::from_millis(self.total_backoff_ms.load(Ordering::Relaxed)),
        }
    }
}

/// Immutable snapshot of tracker counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSummary {
    pub attempts: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub total_backoff: Duration,
}
