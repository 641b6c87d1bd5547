//! The FIFO wait queue (spec §3/§5).
//!
//! Grounded on `pool/connection/wait_queue.rs::WaitQueue` and
//! `transaction/locks.rs::LockTableEntry.waiting`: both guard a
//! `VecDeque` with a short-held mutex rather than a full lock-free Michael-
//! Scott queue. Spec §5 explicitly allows this — "strict linearisability is
//! not required for peek because final decisions are gated by the `current`
//! CAS" — so the mutex is held only for the O(1) append/peek and the rare
//! O(n) remove-by-identity; it never overlaps with the CAS handoff itself.

use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::request::Request;

/// FIFO of pending [`Request`]s, used by the handoff protocol to pick the
/// next holder.
pub(crate) struct WaitQueue<O> {
    entries: Mutex<VecDeque<Arc<Request<O>>>>,
}

impl<O: Eq + Hash + Clone> WaitQueue<O> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a request to the back of the queue (arrival order).
    pub(crate) fn push_back(&self, request: Arc<Request<O>>) {
        self.entries.lock().push_back(request);
    }

    /// Look at (without removing) the request at the head of the queue.
    pub(crate) fn peek_front(&self) -> Option<Arc<Request<O>>> {
        self.entries.lock().front().cloned()
    }

    /// Remove a specific request by identity, wherever it sits in the
    /// queue. O(n); rare in practice because removal is only reached after
    /// a Request has already left `Waiting`.
    pub(crate) fn remove(&self, target: &Arc<Request<O>>) {
        let mut entries = self.entries.lock();
        if let Some(pos) = entries.iter().position(|r| Arc::ptr_eq(r, target)) {
            entries.remove(pos);
        }
    }

    /// Snapshot of the queue contents in arrival order, for
    /// `Lock::deadlock_check`.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Request<O>>> {
        self.entries.lock().iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::time::SystemTimeService;
    use std::sync::Weak;
    use std::time::Duration;

    fn make(owner: &'static str) -> Arc<Request<&'static str>> {
        Request::new(owner, &SystemTimeService, Duration::from_secs(1), Weak::new())
    }

    #[test]
    fn fifo_order_preserved() {
        let q: WaitQueue<&'static str> = WaitQueue::new();
        let a = make("A");
        let b = make("B");
        q.push_back(a.clone());
        q.push_back(b.clone());

        assert!(Arc::ptr_eq(&q.peek_front().unwrap(), &a));
        q.remove(&a);
        assert!(Arc::ptr_eq(&q.peek_front().unwrap(), &b));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remove_by_identity_skips_non_head() {
        let q: WaitQueue<&'static str> = WaitQueue::new();
        let a = make("A");
        let b = make("B");
        let c = make("C");
        q.push_back(a.clone());
        q.push_back(b.clone());
        q.push_back(c.clone());

        q.remove(&b);
        let snapshot = q.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(Arc::ptr_eq(&snapshot[0], &a));
        assert!(Arc::ptr_eq(&snapshot[1], &c));
    }
}
