//! Error types for the lock primitive.
//!
//! Mirrors the teacher's `transaction::error` convention: a single
//! `thiserror`-derived enum with a crate-local `Result` alias, one variant
//! per error kind the spec names in its error-handling section.

use thiserror::Error;

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors raised by [`crate::Lock`] and [`crate::Request`].
///
/// The spec's null-owner and illegal-`cancel`-target error kinds have no
/// variant here: owners are a non-nullable generic `O`, and
/// [`crate::CancelReason`] restricts `cancel()`'s target to the two legal
/// states, so both conditions are compile-time impossible rather than
/// runtime-checked.
#[derive(Debug, Error)]
pub enum LockError {
    /// `wait()` observed the deadline pass before the request was promoted.
    #[error("lock acquisition timed out after waiting since {waiting_since:?}")]
    Timeout {
        /// When the request first entered the wait queue.
        waiting_since: std::time::Instant,
    },

    /// `wait()` observed a deadlock reported by the external checker.
    #[error("deadlock detected")]
    Deadlock,

    /// An operation observed a state that should be unreachable under
    /// correct use (e.g. waiting on an already-released request).
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// The waiting caller was cooperatively cancelled; the request's own
    /// state is left untouched.
    #[error("wait was interrupted")]
    Interrupted,
}
