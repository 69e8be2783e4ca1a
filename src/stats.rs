//! Saga statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by a coordinator and its node actions
pub struct SagaStats {
    /// Sagas that started running
    pub sagas_started: AtomicU64,
    /// Sagas that ended `Done`
    pub sagas_completed: AtomicU64,
    /// Sagas that ended `RolledBack`
    pub sagas_rolled_back: AtomicU64,
    /// Sagas that ended `Error`
    pub sagas_failed: AtomicU64,
    /// HTTP calls issued, retries included
    pub remote_calls: AtomicU64,
    /// Forward operations that succeeded
    pub forwards_succeeded: AtomicU64,
    /// Forward operations that failed
    pub forwards_failed: AtomicU64,
    /// Backward operations that succeeded
    pub rollbacks_succeeded: AtomicU64,
    /// Backward operations that failed
    pub rollbacks_failed: AtomicU64,
}

impl SagaStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            sagas_started: AtomicU64::new(0),
            sagas_completed: AtomicU64::new(0),
            sagas_rolled_back: AtomicU64::new(0),
            sagas_failed: AtomicU64::new(0),
            remote_calls: AtomicU64::new(0),
            forwards_succeeded: AtomicU64::new(0),
            forwards_failed: AtomicU64::new(0),
            rollbacks_succeeded: AtomicU64::new(0),
            rollbacks_failed: AtomicU64::new(0),
        }
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter
    pub fn snapshot(&self) -> SagaStatsSnapshot {
        SagaStatsSnapshot {
            sagas_started: self.sagas_started.load(Ordering::Relaxed),
            sagas_completed: self.sagas_completed.load(Ordering::Relaxed),
            sagas_rolled_back: self.sagas_rolled_back.load(Ordering::Relaxed),
            sagas_failed: self.sagas_failed.load(Ordering::Relaxed),
            remote_calls: self.remote_calls.load(Ordering::Relaxed),
            forwards_succeeded: self.forwards_succeeded.load(Ordering::Relaxed),
            forwards_failed: self.forwards_failed.load(Ordering::Relaxed),
            rollbacks_succeeded: self.rollbacks_succeeded.load(Ordering::Relaxed),
            rollbacks_failed: self.rollbacks_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for SagaStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SagaStats`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SagaStatsSnapshot {
    /// Sagas that started running
    pub sagas_started: u64,
    /// Sagas that ended `Done`
    pub sagas_completed: u64,
    /// Sagas that ended `RolledBack`
    pub sagas_rolled_back: u64,
    /// Sagas that ended `Error`
    pub sagas_failed: u64,
    /// HTTP calls issued, retries included
    pub remote_calls: u64,
    /// Forward operations that succeeded
    pub forwards_succeeded: u64,
    /// Forward operations that failed
    pub forwards_failed: u64,
    /// Backward operations that succeeded
    pub rollbacks_succeeded: u64,
    /// Backward operations that failed
    pub rollbacks_failed: u64,
}
