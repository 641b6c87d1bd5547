// Lock acquisition performance benchmarks.
// Covers the uncontended fast path and the contended multi-waiter handoff
// path described in the component design's concurrency model.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridlock::Lock;
use std::sync::Arc;
use std::time::Duration;

fn bench_uncontended_acquire_release(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("uncontended_acquire_release", |b| {
        let lock: Lock<u64> = Lock::new();
        let mut owner = 0u64;
        b.iter(|| {
            rt.block_on(async {
                owner += 1;
                let request = lock.acquire_with_timeout(owner, Duration::from_secs(5));
                request.wait().await.unwrap();
                black_box(&request);
                lock.release(&owner);
            });
        });
    });
}

fn bench_contended_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_handoff");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for waiters in [2usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(waiters), &waiters, |b, &waiters| {
            b.iter(|| {
                rt.block_on(async {
                    let lock: Arc<Lock<u64>> = Arc::new(Lock::new());
                    let holder = lock.acquire_with_timeout(0, Duration::from_secs(30));
                    holder.wait().await.unwrap();

                    let requests: Vec<_> = (1..=waiters as u64)
                        .map(|o| lock.acquire_with_timeout(o, Duration::from_secs(30)))
                        .collect();

                    lock.release(&0);
                    for (owner, request) in (1..=waiters as u64).zip(requests.iter()) {
                        request.wait().await.unwrap();
                        lock.release(&owner);
                    }
                    black_box(&lock);
                });
            });
        });
    }

    group.finish();
}

fn bench_idempotent_reacquire(c: &mut Criterion) {
    let lock: Lock<&'static str> = Lock::new();
    let _holder = lock.acquire_with_timeout("holder", Duration::from_secs(60));

    c.bench_function("idempotent_reacquire_no_op", |b| {
        b.iter(|| {
            let request = lock.acquire_with_timeout("waiter", Duration::from_secs(60));
            black_box(&request);
        });
    });
}

criterion_group!(
    benches,
    bench_uncontended_acquire_release,
    bench_contended_handoff,
    bench_idempotent_reacquire
);
criterion_main!(benches);
