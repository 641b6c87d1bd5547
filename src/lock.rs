//! The public owner-keyed mutual-exclusion primitive (spec §3/§4.1/§4.4).
//!
//! Grounded on `transaction/locks.rs::HierarchicalLockManager` for the
//! overall shape (an index of live holders plus a shared wait structure
//! behind an `Arc`), generalized from per-resource lock tables keyed by
//! `(TransactionId, LockResource)` down to a single resource keyed by a
//! single generic owner.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::config::LockConfig;
use crate::deadlock::DeadlockChecker;
use crate::handoff;
use crate::queue::WaitQueue;
use crate::request::{CancelReason, Request};
use crate::stats::LockStats;
use crate::time::{SystemTimeService, TimeService};

/// Shared state behind a [`Lock`]'s `Arc`. Split out from `Lock` itself so
/// that [`Request`] can hold a `Weak` back-reference into it without the
/// `Lock` handle and its internals forming a reference cycle.
pub(crate) struct LockInner<O> {
    pub(crate) current: ArcSwapOption<Request<O>>,
    pub(crate) queue: WaitQueue<O>,
    pub(crate) owners: DashMap<O, Arc<Request<O>>>,
    pub(crate) time_service: Arc<dyn TimeService>,
    pub(crate) release_hook: Option<Arc<dyn Fn() + Send + Sync>>,
    pub(crate) config: LockConfig,
    pub(crate) stats: LockStats,
}

/// An asynchronous, owner-keyed mutual-exclusion primitive.
///
/// Cloning a `Lock` is cheap (it shares one `Arc<LockInner<O>>`); clones
/// refer to the same underlying lock, the way cloning a `HierarchicalLockManager`
/// handle shares one lock table.
pub struct Lock<O> {
    inner: Arc<LockInner<O>>,
}

impl<O> Clone for Lock<O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<O: Eq + Hash + Clone + Send + Sync + 'static> Lock<O> {
    /// A lock with default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(LockConfig::default(), Arc::new(SystemTimeService), None)
    }

    /// A lock with the given configuration, time service, and optional
    /// hook run after every successful release (spec §6's release-hook
    /// collaborator).
    pub fn with_config(
        config: LockConfig,
        time_service: Arc<dyn TimeService>,
        release_hook: Option<Arc<dyn Fn() + Send + Sync>>,
    ) -> Self {
        Self {
            inner: Arc::new(LockInner {
                current: ArcSwapOption::from(None),
                queue: WaitQueue::new(),
                owners: DashMap::new(),
                time_service,
                release_hook,
                config,
                stats: LockStats::default(),
            }),
        }
    }

    /// Requests the lock for `owner` with this lock's configured default
    /// timeout. Idempotent: a second call for an owner with an
    /// already-outstanding request returns that same [`Request`] rather
    /// than creating a new one (spec §4.1 invariant 2).
    pub fn acquire(&self, owner: O) -> Arc<Request<O>> {
        let timeout = self.inner.config.default_timeout;
        self.acquire_with_timeout(owner, timeout)
    }

    /// Like [`Lock::acquire`], with an explicit timeout.
    pub fn acquire_with_timeout(&self, owner: O, timeout: Duration) -> Arc<Request<O>> {
        match self.inner.owners.entry(owner.clone()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let request = Request::new(
                    owner,
                    self.inner.time_service.as_ref(),
                    timeout,
                    Arc::downgrade(&self.inner),
                );
                slot.insert(request.clone());
                self.inner.queue.push_back(request.clone());
                self.inner.stats.record_acquire_attempt();
                debug!(queue_depth = self.inner.queue.len(), "request enqueued");
                handoff::run(&self.inner, None);
                request
            }
        }
    }

    /// Releases the lock on behalf of `owner`, if that owner has an
    /// outstanding request. A no-op if `owner` has none (spec §4.4's
    /// "release of an owner with no outstanding request").
    ///
    /// Releasing an owner whose request is still `Waiting` (never reached
    /// `Acquired`) cancels that request instead of handing off the lock it
    /// never held; the handoff routine's own CAS gates this correctly
    /// either way, since it only takes effect if the released request was
    /// actually installed as `current`.
    pub fn release(&self, owner: &O) {
        let Some(entry) = self.inner.owners.get(owner) else {
            return;
        };
        let request = entry.value().clone();
        drop(entry);
        request.set_released();
        handoff::run(&self.inner, Some(request));
    }

    /// The owner currently holding the lock, if any.
    pub fn lock_owner(&self) -> Option<O> {
        self.inner
            .current
            .load_full()
            .map(|request| request.owner().clone())
    }

    pub fn is_locked(&self) -> bool {
        self.inner.current.load_full().is_some()
    }

    /// True iff `owner` has an outstanding request (waiting or holding).
    pub fn contains_owner(&self, owner: &O) -> bool {
        self.inner.owners.contains_key(owner)
    }

    /// Runs one pass of deadlock detection over the wait queue (spec
    /// §4.4): for each waiting request other than the current holder, asks
    /// `checker` whether it closes a cycle against the holder; if so,
    /// cancels it into `Deadlocked` and elects the next waiter.
    ///
    /// A no-op only if nobody currently holds the lock. This always runs
    /// the full scan regardless of [`LockConfig::deadlock_detection_enabled`]
    /// — that flag is advisory, for embedders that want to skip calling
    /// this method entirely; see [`Lock::deadlock_detection_enabled`].
    pub fn deadlock_check(&self, checker: &dyn DeadlockChecker<O>) {
        let Some(current) = self.inner.current.load_full() else {
            return;
        };

        for pending in self.inner.queue.snapshot() {
            pending.check_timeout(self.inner.time_service.as_ref());
            if !pending.is_waiting() {
                continue;
            }
            if pending.owner() == current.owner() {
                continue;
            }
            if checker.deadlock_detected(pending.owner(), current.owner())
                && pending.cancel(CancelReason::Deadlocked)
            {
                self.inner.stats.record_deadlock();
            }
        }
    }

    /// The configured deadlock-detection toggle. `deadlock_check` itself
    /// always runs in full when called; this is advisory information for
    /// an embedder deciding whether to call it at all (e.g. skip scheduling
    /// periodic `deadlock_check` calls when this is false).
    pub fn deadlock_detection_enabled(&self) -> bool {
        self.inner.config.deadlock_detection_enabled
    }

    /// A snapshot of this lock's counters.
    pub fn stats(&self) -> crate::stats::LockStatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl<O: Eq + Hash + Clone + Send + Sync + 'static> Default for Lock<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: std::fmt::Debug + Eq + Hash + Clone + Send + Sync + 'static> std::fmt::Debug for Lock<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("current_owner", &self.lock_owner())
            .field("queue_depth", &self.inner.queue.len())
            .field("stats", &self.inner.stats.snapshot())
            .finish()
    }
}
