//! The CAS handoff protocol that elects the next holder (spec §4.3).
//!
//! Grounded on `buffer/lockfree_latch.rs::OptimisticLatch`'s
//! compare-and-retry loop, generalized from a version counter to an
//! `Option<Arc<Request<O>>>` slot via `arc_swap::ArcSwapOption` (the teacher's
//! own `AtomicCell`-based latch only works for `Copy` payloads; an `Arc`
//! isn't `Copy`, so this crate reaches for `arc-swap`, which the pack's
//! `michaelsutton-rusty-kaspa` manifest also depends on for the same reason).

use std::hash::Hash;
use std::sync::Arc;

use crate::lock::LockInner;
use crate::request::Request;

/// Runs the handoff protocol: tries to install `releaser`'s successor (the
/// current queue head) as the new holder, retrying against the next waiter
/// whenever the candidate it just installed turns out to have already left
/// `Waiting` (timed out or was deadlocked the instant before it won `current`).
///
/// `releaser` is `None` when called right after a brand new request was
/// appended by `acquire` (nothing to swap out); `Some` when called after a
/// request left `Waiting` (release, timeout, deadlock, cancel) — in the
/// latter case, if `releaser` was never actually installed as `current`, the
/// first CAS attempt simply fails and this returns having done nothing,
/// which is the correct no-op for "release of a non-holder".
pub(crate) fn run<O>(inner: &LockInner<O>, mut releaser: Option<Arc<Request<O>>>)
where
    O: Eq + Hash + Clone + Send + Sync + 'static,
{
    loop {
        let candidate = match inner.queue.peek_front() {
            Some(candidate) => candidate,
            None => {
                if let Some(r) = releaser {
                    cas_current(&inner.current, Some(&r), None);
                }
                return;
            }
        };

        if !cas_current(&inner.current, releaser.as_ref(), Some(candidate.clone())) {
            // Someone else already changed `current` out from under us.
            return;
        }

        inner.queue.remove(&candidate);
        if candidate.set_acquire() {
            inner.stats.record_acquired();
            return;
        }
        // Candidate had already left Waiting (timeout/deadlock raced us).
        // It is now current; retry the loop with it as the new releaser.
        releaser = Some(candidate);
    }
}

fn cas_current<O>(
    slot: &arc_swap::ArcSwapOption<Request<O>>,
    expected: Option<&Arc<Request<O>>>,
    new: Option<Arc<Request<O>>>,
) -> bool {
    let expected_owned = expected.cloned();
    let witnessed = slot.compare_and_swap(&expected_owned, new);
    option_ptr_eq(&*witnessed, &expected_owned)
}

fn option_ptr_eq<O>(a: &Option<Arc<Request<O>>>, b: &Option<Arc<Request<O>>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    // Exercised end-to-end through `Lock` in `lock.rs` and the integration
    // tests; this module holds only the CAS primitive, which has no
    // observable behavior in isolation from the queue it guards.
}
