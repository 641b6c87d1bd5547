//! Lock-wide counters (spec §10.5 ambient expansion).
//!
//! Grounded on `transaction/locks.rs::LockManagerStats`'s relaxed-atomic
//! counter bundle with a point-in-time snapshot method.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing counters maintained by a [`crate::Lock`].
///
/// All increments use `Ordering::Relaxed`: these are observability counters,
/// not synchronization, so only the final totals matter, never their
/// ordering relative to other memory operations.
#[derive(Debug, Default)]
pub struct LockStats {
    acquires_attempted: AtomicU64,
    acquires_completed: AtomicU64,
    releases: AtomicU64,
    timeouts: AtomicU64,
    deadlocks: AtomicU64,
}

impl LockStats {
    pub(crate) fn record_acquire_attempt(&self) {
        self.acquires_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_acquired(&self) {
        self.acquires_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_released(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deadlock(&self) {
        self.deadlocks.fetch_add(1, Ordering::Relaxed);
    }

    /// A consistent-enough point-in-time snapshot for logging/metrics.
    pub fn snapshot(&self) -> LockStatsSnapshot {
        LockStatsSnapshot {
            acquires_attempted: self.acquires_attempted.load(Ordering::Relaxed),
            acquires_completed: self.acquires_completed.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            deadlocks: self.deadlocks.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStatsSnapshot {
    pub acquires_attempted: u64,
    pub acquires_completed: u64,
    pub releases: u64,
    pub timeouts: u64,
    pub deadlocks: u64,
}
