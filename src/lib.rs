//! An asynchronous, owner-keyed mutual-exclusion primitive for distributed
//! in-memory data grids' transactional locking layers.
//!
//! A [`Lock`] serializes access to one logical resource among competing
//! owners (e.g. transaction identifiers) rather than threads. Acquisition
//! never blocks the calling thread: [`Lock::acquire`] returns a
//! [`Request`] immediately, which callers poll with
//! [`Request::is_available`], await with [`Request::wait`], or subscribe to
//! with [`Request::add_listener`].
//!
//! ```no_run
//! use gridlock::Lock;
//!
//! # async fn run() {
//! let lock: Lock<&'static str> = Lock::new();
//! let request = lock.acquire("txn-1");
//! request.wait().await.unwrap();
//! // ... critical section ...
//! lock.release(&"txn-1");
//! # }
//! ```

mod config;
mod deadlock;
mod error;
mod handoff;
mod listener;
mod lock;
mod queue;
mod request;
mod stats;
mod time;

pub use config::LockConfig;
pub use deadlock::DeadlockChecker;
pub use error::{LockError, Result};
pub use listener::{Listener, ListenerState};
pub use lock::Lock;
pub use request::{CancelReason, Request};
pub use stats::LockStatsSnapshot;
pub use time::{SystemTimeService, TimeService};
