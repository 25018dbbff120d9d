//! Cooperative resource pool for tokio tasks.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use tokio::sync::Semaphore;

use super::pool::{PoolCounters, PoolLimits, PoolStats};

/// Cooperative resource pool: the same admission-control contract as
/// [`ResourcePool`](super::ResourcePool), but `acquire` is a suspension
/// point of the tokio scheduler rather than a blocking call.
///
/// Waiting tasks are parked on a FIFO-fair [`Semaphore`], never busy-polled.
/// The bounded wait queue is enforced by a CAS loop on an atomic counter; a
/// task that abandons its wait (future dropped before `acquire` resolves)
/// leaves the queue through a drop guard without ever consuming a slot.
pub struct AsyncResourcePool {
    limits: PoolLimits,
    permits: Semaphore,
    in_use: AtomicU32,
    queued: AtomicUsize,
    counters: PoolCounters,
}

/// Removes a waiting task from the queue count on every exit path,
/// including cancellation of the `acquire` future.
struct QueuedGuard<'a>(&'a AtomicUsize);

impl Drop for QueuedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AsyncResourcePool {
    /// Create a pool with the given limits.
    pub fn new(limits: PoolLimits) -> Self {
        let permits = Semaphore::new(limits.capacity as usize);
        Self {
            limits,
            permits,
            in_use: AtomicU32::new(0),
            queued: AtomicUsize::new(0),
            counters: PoolCounters::default(),
        }
    }

    /// The limits this pool was constructed with.
    pub const fn limits(&self) -> &PoolLimits {
        &self.limits
    }

    /// Attempt to take one slot, suspending up to the configured timeout.
    ///
    /// Returns `true` when a slot was granted; `false` on fast rejection
    /// (wait queue full) or timeout, in which case the caller holds nothing
    /// and must not call [`release`](Self::release).
    pub async fn acquire(&self) -> bool {
        if let Ok(permit) = self.permits.try_acquire() {
            permit.forget();
            self.in_use.fetch_add(1, Ordering::AcqRel);
            self.counters.acquired_total.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        if !self.try_join_queue() {
            self.counters.rejected_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                capacity = self.limits.capacity,
                max_queue_depth = self.limits.max_queue_depth,
                "acquire rejected: wait queue full"
            );
            return false;
        }
        let _queued = QueuedGuard(&self.queued);

        let granted = match self.limits.acquire_timeout {
            Some(wait) => match tokio::time::timeout(wait, self.permits.acquire()).await {
                Ok(Ok(permit)) => {
                    permit.forget();
                    true
                }
                // Never closed in normal operation.
                Ok(Err(_)) => false,
                Err(_) => {
                    self.counters.timed_out_total.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("acquire timed out waiting for slot");
                    false
                }
            },
            None => match self.permits.acquire().await {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_) => false,
            },
        };

        if granted {
            self.in_use.fetch_add(1, Ordering::AcqRel);
            self.counters.acquired_total.fetch_add(1, Ordering::Relaxed);
        }
        granted
    }

    /// Reserve a place in the bounded wait queue with a CAS loop.
    fn try_join_queue(&self) -> bool {
        let mut current = self.queued.load(Ordering::Acquire);
        loop {
            if current >= self.limits.max_queue_depth {
                return false;
            }
            match self.queued.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Return exactly one slot to the pool, waking the FIFO-front waiter.
    ///
    /// Not a suspension point; callable from synchronous drop paths.
    pub fn release(&self) {
        let prev = self.in_use.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "release without a matching acquire");
        self.permits.add_permits(1);
    }

    /// Snapshot of occupancy and cumulative counters.
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(
            &self.limits,
            self.in_use.load(Ordering::Acquire),
            self.queued.load(Ordering::Acquire),
        )
    }
}
