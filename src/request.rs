//! The per-attempt promise returned by [`crate::Lock::acquire`] (spec §3/§4.2).
//!
//! Grounded on `buffer/lockfree_latch.rs`'s CAS-retry-loop style for state
//! transitions and `transaction/locks.rs::LockRequest`'s field shape
//! (owner/mode/resource/granted/request_time generalized here to
//! owner/deadline/state).

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::{LockError, Result};
use crate::handoff;
use crate::listener::{Listener, ListenerState};
use crate::lock::LockInner;
use crate::time::TimeService;

/// Request lifecycle state (spec §3 invariant 4: monotone transitions,
/// `Released` terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum State {
    Waiting = 0,
    Acquired = 1,
    Released = 2,
    TimedOut = 3,
    Deadlocked = 4,
}

impl State {
    fn from_u8(v: u8) -> State {
        match v {
            0 => State::Waiting,
            1 => State::Acquired,
            2 => State::Released,
            3 => State::TimedOut,
            4 => State::Deadlocked,
            other => unreachable!("invalid Request state byte {other}"),
        }
    }
}

/// The target of [`Request::cancel`].
///
/// Restricting this to two variants makes the spec's `IllegalArgument`
/// ("`cancel(state)` with state not in {`TimedOut`, `Deadlocked`}") a
/// compile-time impossibility rather than a runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    TimedOut,
    Deadlocked,
}

impl CancelReason {
    fn target_state(self) -> State {
        match self {
            CancelReason::TimedOut => State::TimedOut,
            CancelReason::Deadlocked => State::Deadlocked,
        }
    }

    fn listener_state(self) -> ListenerState {
        match self {
            CancelReason::TimedOut => ListenerState::TimedOut,
            CancelReason::Deadlocked => ListenerState::Deadlocked,
        }
    }
}

/// A single lock acquisition attempt — the "lock promise" of the spec.
///
/// Returned by [`crate::Lock::acquire`]. Can be polled with
/// [`Request::is_available`], awaited with [`Request::wait`], or have a
/// listener attached with [`Request::add_listener`], all without blocking
/// the thread that called `acquire`.
pub struct Request<O> {
    owner: O,
    deadline: Instant,
    created_at: Instant,
    state: AtomicU8,
    notify: Notify,
    fired: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
    self_ref: Weak<Request<O>>,
    lock: Weak<LockInner<O>>,
}

impl<O: Eq + Hash + Clone + Send + Sync + 'static> Request<O> {
    pub(crate) fn new(
        owner: O,
        time_service: &dyn TimeService,
        timeout: Duration,
        lock: Weak<LockInner<O>>,
    ) -> Arc<Self> {
        let now = Instant::now();
        Arc::new_cyclic(|self_ref| Self {
            deadline: time_service.expected_end(now, timeout),
            created_at: now,
            state: AtomicU8::new(State::Waiting as u8),
            notify: Notify::new(),
            fired: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            self_ref: self_ref.clone(),
            lock,
            owner,
        })
    }

    /// The owner identity supplied at `acquire` time.
    pub fn owner(&self) -> &O {
        &self.owner
    }

    /// First runs [`Request::check_timeout`] (may transition `Waiting` ->
    /// `TimedOut`), then reports whether the request has left `Waiting`.
    pub fn is_available(&self) -> bool {
        self.run_check_timeout();
        !self.is_waiting()
    }

    /// Block until this request is settled: `Ok(())` once acquired, or an
    /// error describing why it will never be acquired.
    ///
    /// Re-checks the deadline and re-registers interest in the notifier on
    /// every loop iteration, so a notification racing with the check can
    /// never be missed (the `notified()` future is created before the
    /// state is inspected).
    pub async fn wait(&self) -> Result<()> {
        loop {
            let notified = self.notify.notified();
            self.run_check_timeout();

            match State::from_u8(self.state.load(Ordering::Acquire)) {
                State::Acquired => return Ok(()),
                State::Released => {
                    return Err(LockError::IllegalState(
                        "wait() called on an already-released request",
                    ))
                }
                State::TimedOut => {
                    self.set_released();
                    return Err(LockError::Timeout {
                        waiting_since: self.created_at,
                    });
                }
                State::Deadlocked => {
                    self.set_released();
                    return Err(LockError::Deadlock);
                }
                State::Waiting => {
                    let remaining = self
                        .lock
                        .upgrade()
                        .map(|inner| inner.time_service.remaining(self.deadline))
                        .unwrap_or(Duration::ZERO)
                        .max(Duration::from_millis(1));
                    let _ = tokio::time::timeout(remaining, notified).await;
                    // loop: re-check state/deadline regardless of timeout outcome
                }
            }
        }
    }

    /// Like [`Request::wait`], but also races against a cooperative
    /// cancellation future. If `cancel` resolves first, returns
    /// `Err(LockError::Interrupted)` without altering this request's state.
    pub async fn wait_interruptible<C>(&self, cancel: C) -> Result<()>
    where
        C: std::future::Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.wait() => result,
            _ = cancel => Err(LockError::Interrupted),
        }
    }

    /// Registers a listener invoked once the notifier fires. If it has
    /// already fired, the listener runs shortly after registration on the
    /// crate's `tokio` runtime instead of inline.
    pub fn add_listener(&self, listener: Listener) {
        let mut listeners = self.listeners.lock();
        if self.fired.load(Ordering::Acquire) {
            drop(listeners);
            let state = self.listener_state();
            tokio::spawn(async move { listener(state) });
        } else {
            listeners.push(listener);
        }
    }

    /// Attempts to cancel a waiting request into a terminal state. A no-op
    /// if the request has already left `Waiting`. Returns true iff this
    /// call performed the transition.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let target = reason.target_state();
        match self.state.compare_exchange(
            State::Waiting as u8,
            target as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                debug!(?target, "request cancelled while waiting");
                self.fire();
                self.run_handoff_as_releaser();
                true
            }
            Err(_) => false,
        }
    }

    /// Called by the handoff routine immediately after it CAS-installs
    /// this request as `current`. Returns true iff the resulting state is
    /// `Acquired`; false means the request had already left `Waiting`
    /// (timed out / deadlocked / released) before the handoff reached it.
    pub(crate) fn set_acquire(&self) -> bool {
        let acquired = self
            .state
            .compare_exchange(
                State::Waiting as u8,
                State::Acquired as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if acquired {
            self.fire();
        }
        acquired
    }

    /// Drives this request to `Released` from whichever state it is
    /// currently in, running cleanup exactly once. Returns true iff this
    /// call performed the terminal transition.
    pub(crate) fn set_released(&self) -> bool {
        loop {
            let current = self.state.load(Ordering::Acquire);
            if current == State::Released as u8 {
                return false;
            }
            match self.state.compare_exchange(
                current,
                State::Released as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.fire();
                    self.cleanup();
                    return true;
                }
                // Lost a race with a concurrent timeout/deadlock/acquire
                // transition; retry from whatever state it left us in.
                Err(_) => continue,
            }
        }
    }

    /// If still `Waiting` and the deadline has passed, transitions to
    /// `TimedOut` and elects the next waiter.
    pub(crate) fn check_timeout(&self, time_service: &dyn TimeService) {
        if self.state.load(Ordering::Acquire) != State::Waiting as u8 {
            return;
        }
        if !time_service.expired(self.deadline) {
            return;
        }
        if self
            .state
            .compare_exchange(
                State::Waiting as u8,
                State::TimedOut as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            warn!(owner = ?std::any::type_name::<O>(), "request timed out while waiting");
            self.fire();
            if let Some(inner) = self.lock.upgrade() {
                inner.stats.record_timeout();
            }
            self.run_handoff_as_releaser();
        }
    }

    pub(crate) fn is_waiting(&self) -> bool {
        self.state.load(Ordering::Acquire) == State::Waiting as u8
    }

    fn run_check_timeout(&self) {
        if let Some(inner) = self.lock.upgrade() {
            self.check_timeout(inner.time_service.as_ref());
        }
    }

    fn run_handoff_as_releaser(&self) {
        if let (Some(me), Some(inner)) = (self.self_ref.upgrade(), self.lock.upgrade()) {
            handoff::run(&inner, Some(me));
        }
    }

    /// Removes this request from the owning lock's owner index and runs
    /// the release hook. Runs at most once (only reached via a successful
    /// `set_released` CAS).
    fn cleanup(&self) {
        if let Some(inner) = self.lock.upgrade() {
            inner.owners.remove(&self.owner);
            inner.stats.record_released();
            if let Some(hook) = &inner.release_hook {
                hook();
            }
        }
    }

    /// Fires the notifier and dispatches pending listeners, exactly once
    /// per request (guarded by `fired`, independent of which transition
    /// triggered it — spec invariant 5).
    fn fire(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.notify.notify_waiters();
        let pending: Vec<Listener> = std::mem::take(&mut *self.listeners.lock());
        let state = self.listener_state();
        for listener in pending {
            tokio::spawn(async move { listener(state) });
        }
    }

    fn listener_state(&self) -> ListenerState {
        match State::from_u8(self.state.load(Ordering::Acquire)) {
            State::Acquired | State::Released => ListenerState::Acquired,
            State::TimedOut => ListenerState::TimedOut,
            State::Deadlocked => ListenerState::Deadlocked,
            State::Waiting => {
                unreachable!("listener state is only read after the notifier has fired")
            }
        }
    }
}

impl<O: fmt::Debug> fmt::Debug for Request<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("owner", &self.owner)
            .field("state", &State::from_u8(self.state.load(Ordering::Relaxed)))
            .finish()
    }
}
