use std::sync::Arc;
use std::time::Duration;

use gridlock::{CancelReason, Lock, LockError};

#[tokio::test]
async fn single_owner_free_lock() {
    let lock: Lock<&'static str> = Lock::new();
    let p = lock.acquire_with_timeout("A", Duration::from_secs(1));
    assert!(p.is_available());
    p.wait().await.unwrap();
    lock.release(&"A");
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn two_owners_queued_handoff() {
    let lock: Lock<&'static str> = Lock::new();
    let _pa = lock.acquire_with_timeout("A", Duration::from_secs(5));
    let pb = lock.acquire_with_timeout("B", Duration::from_secs(5));
    assert!(!pb.is_available());

    lock.release(&"A");
    assert!(pb.is_available());
    pb.wait().await.unwrap();
}

#[tokio::test]
async fn timeout_in_queue() {
    let lock: Lock<&'static str> = Lock::new();
    let pa = lock.acquire_with_timeout("A", Duration::from_secs(10));
    pa.wait().await.unwrap();
    let pb = lock.acquire_with_timeout("B", Duration::from_millis(50));

    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = pb.wait().await.unwrap_err();
    assert!(matches!(err, LockError::Timeout { .. }));
    assert!(!lock.contains_owner(&"B"));

    lock.release(&"A");
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn cancel_via_deadlock() {
    let lock: Lock<&'static str> = Lock::new();
    let pa = lock.acquire_with_timeout("A", Duration::from_secs(5));
    pa.wait().await.unwrap();
    let pb = lock.acquire_with_timeout("B", Duration::from_secs(5));

    lock.deadlock_check(&|waiter: &&str, holder: &&str| *waiter == "B" && *holder == "A");

    let err = pb.wait().await.unwrap_err();
    assert!(matches!(err, LockError::Deadlock));
}

#[tokio::test]
async fn release_of_non_holder() {
    let lock: Lock<&'static str> = Lock::new();
    let pa = lock.acquire_with_timeout("A", Duration::from_secs(1));
    let pb = lock.acquire_with_timeout("B", Duration::from_secs(1));

    lock.release(&"B");
    assert!(!lock.contains_owner(&"B"));

    pa.wait().await.unwrap();
    assert_eq!(lock.lock_owner(), Some("A"));

    let err = pb.wait().await.unwrap_err();
    assert!(matches!(err, LockError::IllegalState(_)));
}

#[tokio::test]
async fn idempotent_reacquire() {
    let lock: Lock<&'static str> = Lock::new();
    let p1 = lock.acquire_with_timeout("A", Duration::from_secs(1));
    let p2 = lock.acquire_with_timeout("A", Duration::from_secs(1));
    assert!(Arc::ptr_eq(&p1, &p2));

    lock.release(&"A");
    assert!(p1.wait().await.is_ok());
    assert!(p2.wait().await.is_ok());
}

#[tokio::test]
async fn cancel_is_a_noop_once_settled() {
    let lock: Lock<&'static str> = Lock::new();
    let p = lock.acquire_with_timeout("A", Duration::from_secs(1));
    p.wait().await.unwrap();
    assert!(!p.cancel(CancelReason::TimedOut));
}

#[tokio::test]
async fn many_waiters_drain_in_fifo_order() {
    let lock: Lock<u32> = Lock::new();
    let holder = lock.acquire_with_timeout(0, Duration::from_secs(5));
    holder.wait().await.unwrap();

    let waiters: Vec<_> = (1..=5)
        .map(|o| lock.acquire_with_timeout(o, Duration::from_secs(5)))
        .collect();

    let mut observed = Vec::new();
    lock.release(&0);
    for (i, waiter) in waiters.iter().enumerate() {
        waiter.wait().await.unwrap();
        observed.push(i as u32 + 1);
        lock.release(&(i as u32 + 1));
    }

    assert_eq!(observed, vec![1, 2, 3, 4, 5]);
    assert!(!lock.is_locked());
}
