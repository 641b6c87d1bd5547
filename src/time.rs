//! The time service external collaborator (spec §6).
//!
//! Grounded on `transaction/timeout.rs`'s `TimeoutManager`, generalized from
//! a per-transaction deadline table into the narrower pure-function contract
//! this primitive needs: deadline arithmetic, remaining time, and expiry
//! checks against a monotonic clock.

use std::time::{Duration, Instant};

/// Monotonic deadline arithmetic, injected into [`crate::Lock`] at
/// construction time.
///
/// The spec's open question about a runtime-mutable time service is
/// resolved as a non-feature here: `Lock::new` takes one `Arc<dyn
/// TimeService>` and never swaps it.
pub trait TimeService: Send + Sync {
    /// Compute the absolute deadline for a request created `now`, with the
    /// given `timeout`.
    fn expected_end(&self, now: Instant, timeout: Duration) -> Instant;

    /// Time remaining until `deadline`, as seen from the current instant.
    /// Zero (not negative) once the deadline has passed.
    fn remaining(&self, deadline: Instant) -> Duration;

    /// True iff `now >= deadline`.
    fn expired(&self, deadline: Instant) -> bool;
}

/// Default [`TimeService`] backed by `std::time::Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeService;

impl TimeService for SystemTimeService {
    fn expected_end(&self, now: Instant, timeout: Duration) -> Instant {
        now + timeout
    }

    fn remaining(&self, deadline: Instant) -> Duration {
        deadline.saturating_duration_since(Instant::now())
    }

    fn expired(&self, deadline: Instant) -> bool {
        Instant::now() >= deadline
    }
}
