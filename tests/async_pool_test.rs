//! Integration tests for the cooperative `AsyncResourcePool`.

#![cfg(feature = "tokio-runtime")]

use std::sync::Arc;
use std::time::{Duration, Instant};

use bulkhead_pool::core::{AsyncResourcePool, PoolLimits};

fn limits(capacity: u32, max_queue_depth: usize, timeout_ms: Option<u64>) -> PoolLimits {
    PoolLimits {
        capacity,
        max_queue_depth,
        acquire_timeout: timeout_ms.map(Duration::from_millis),
    }
}

/// Poll a predicate on the pool until it holds or the deadline passes.
async fn wait_for(pool: &AsyncResourcePool, pred: impl Fn(&AsyncResourcePool) -> bool) {
    let start = Instant::now();
    while !pred(pool) {
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "condition not reached; stats: {:?}",
            pool.stats()
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test]
async fn acquires_up_to_capacity_without_suspending() {
    let pool = AsyncResourcePool::new(limits(3, 0, Some(0)));
    for _ in 0..3 {
        assert!(pool.acquire().await);
    }
    let stats = pool.stats();
    assert_eq!(stats.in_use, 3);
    assert_eq!(stats.acquired_total, 3);
}

#[tokio::test]
async fn bounded_queue_then_fast_rejection_then_fifo_grant() {
    let pool = Arc::new(AsyncResourcePool::new(limits(2, 1, None)));

    assert!(pool.acquire().await); // A
    assert!(pool.acquire().await); // B

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.acquire().await }) // C
    };
    wait_for(&pool, |p| p.stats().queued == 1).await;

    assert!(!pool.acquire().await); // D: queue full, no suspension
    assert_eq!(pool.stats().rejected_total, 1);

    pool.release(); // A releases; C must be granted
    assert!(waiter.await.unwrap());

    let stats = pool.stats();
    assert_eq!(stats.in_use, 2);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.acquired_total, 3);
}

#[tokio::test]
async fn wait_timeout_rejects_without_leaking() {
    let pool = AsyncResourcePool::new(limits(1, 1, Some(20)));
    assert!(pool.acquire().await);

    assert!(!pool.acquire().await);
    let stats = pool.stats();
    assert_eq!(stats.timed_out_total, 1);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.in_use, 1);

    pool.release();
    assert!(pool.acquire().await);
}

#[tokio::test]
async fn cancelled_waiter_leaves_the_queue_and_consumes_nothing() {
    let pool = Arc::new(AsyncResourcePool::new(limits(1, 1, None)));
    assert!(pool.acquire().await);

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.acquire().await })
    };
    wait_for(&pool, |p| p.stats().queued == 1).await;

    // The waiter abandons its wait before acquire resolves.
    waiter.abort();
    wait_for(&pool, |p| p.stats().queued == 0).await;

    pool.release();
    assert!(pool.acquire().await);
    let stats = pool.stats();
    assert_eq!(stats.in_use, 1);
    assert_eq!(stats.queued, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_use_never_exceeds_capacity_under_task_churn() {
    const CAPACITY: u32 = 4;
    const TASKS: usize = 32;

    let pool = Arc::new(AsyncResourcePool::new(limits(CAPACITY, TASKS, None)));

    let tasks: Vec<_> = (0..TASKS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                assert!(pool.acquire().await);
                assert!(pool.stats().in_use <= CAPACITY);
                tokio::time::sleep(Duration::from_millis(2)).await;
                pool.release();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.acquired_total, TASKS as u64);
}
