//! The lock listener external collaborator (spec §6).
//!
//! Grounded on `transaction/traits.rs::TransactionEventListener`: a small
//! `Send + Sync` trait object invoked once per registration, generalized
//! from transaction lifecycle events down to this primitive's terminal
//! states.

/// The state delivered to a [`crate::Request::add_listener`] callback.
///
/// Per spec §6/§9, a `Released` state observed internally (the holder
/// acquired and then released before the listener ran) is reported here as
/// `Acquired` — from the listener's perspective the critical section was
/// still reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// The request reached (or passed through) `Acquired`.
    Acquired,
    /// The request's deadline passed before it was promoted.
    TimedOut,
    /// The external deadlock checker reported a cycle involving this
    /// request.
    Deadlocked,
}

/// A one-shot callback attached to a [`crate::Request`] via
/// [`crate::Request::add_listener`].
///
/// Listeners run on the crate's `tokio` runtime after the request's
/// notifier fires (spec §5: "listeners must not assume any particular
/// thread context and must not block").
pub type Listener = Box<dyn FnOnce(ListenerState) + Send + 'static>;
