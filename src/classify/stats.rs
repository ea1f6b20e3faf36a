//! Running classification counters for observability.

use parking_lot::Mutex;
use serde::Serialize;

/// A point-in-time snapshot of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounters {
    /// Items classified (including fail-safe rejections).
    pub total: u64,
    /// Items accepted as technical.
    pub accepted: u64,
    /// Items rejected as non-technical (including fail-safe rejections).
    pub rejected: u64,
    /// Provider failures resolved as rejections.
    pub errors: u64,
}

/// Thread-safe running counters, reset on demand.
#[derive(Debug, Default)]
pub struct ClassificationStats {
    counters: Mutex<ClassificationCounters>,
}

impl ClassificationStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a normal verdict.
    pub fn record_verdict(&self, is_technical: bool) {
        let mut counters = self.counters.lock();
        counters.total += 1;
        if is_technical {
            counters.accepted += 1;
        } else {
            counters.rejected += 1;
        }
    }

    /// Record a fail-safe rejection with no error.
    pub fn record_rejected(&self) {
        self.record_verdict(false);
    }

    /// Record a provider failure; the item is also counted as rejected.
    pub fn record_error(&self) {
        let mut counters = self.counters.lock();
        counters.total += 1;
        counters.rejected += 1;
        counters.errors += 1;
    }

    /// Snapshot the current counters.
    pub fn snapshot(&self) -> ClassificationCounters {
        *self.counters.lock()
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        *self.counters.lock() = ClassificationCounters::default();
    }
}
