//! Construction-time configuration (spec §10.3 ambient expansion).
//!
//! Grounded on `lib.rs::Config`/`transaction/locks.rs::LockManagerConfig`'s
//! small plain-struct-with-`Default` pattern, narrowed to the handful of
//! knobs this primitive actually has.

use std::time::Duration;

/// Configuration passed to [`crate::Lock::with_config`].
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Timeout applied by [`crate::Lock::acquire`] when the caller does not
    /// specify one via [`crate::Lock::acquire_with_timeout`].
    pub default_timeout: Duration,

    /// Advisory only — read via [`crate::Lock::deadlock_detection_enabled`].
    /// `deadlock_check` always runs its full scan regardless of this value;
    /// it exists for an embedder deciding whether to call `deadlock_check`
    /// at all (e.g. skip scheduling a periodic sweep), not as a gate inside
    /// the operation itself.
    pub deadlock_detection_enabled: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            deadlock_detection_enabled: true,
        }
    }
}
