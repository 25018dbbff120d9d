//! Blocking resource pool with capacity accounting and a bounded FIFO wait queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

/// Capacity limits for a pool, fixed at construction.
#[derive(Debug, Clone)]
pub struct PoolLimits {
    /// Maximum concurrent slots.
    pub capacity: u32,
    /// Maximum callers allowed to wait for a slot at once. A queue depth of
    /// zero means callers are rejected as soon as all slots are busy.
    pub max_queue_depth: usize,
    /// Maximum time a caller may wait for a slot. `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
}

/// Point-in-time snapshot of a pool's occupancy and cumulative counters.
///
/// Snapshots may race with concurrent acquire/release; the values are
/// individually accurate but not transactionally consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Configured slot capacity.
    pub capacity: u32,
    /// Configured wait-queue bound.
    pub max_queue_depth: usize,
    /// Slots currently occupied.
    pub in_use: u32,
    /// Callers currently waiting for a slot.
    pub queued: usize,
    /// Total successful acquisitions.
    pub acquired_total: u64,
    /// Total fast rejections (wait queue full).
    pub rejected_total: u64,
    /// Total waits that elapsed without a slot freeing.
    pub timed_out_total: u64,
}

/// Cumulative counters shared by both pool variants (thread-safe).
#[derive(Debug, Default)]
pub struct PoolCounters {
    /// Total successful acquisitions.
    pub acquired_total: AtomicU64,
    /// Total fast rejections.
    pub rejected_total: AtomicU64,
    /// Total wait timeouts.
    pub timed_out_total: AtomicU64,
}

impl PoolCounters {
    /// Fold the counters into a stats snapshot with the given occupancy.
    pub fn snapshot(&self, limits: &PoolLimits, in_use: u32, queued: usize) -> PoolStats {
        PoolStats {
            capacity: limits.capacity,
            max_queue_depth: limits.max_queue_depth,
            in_use,
            queued,
            acquired_total: self.acquired_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            timed_out_total: self.timed_out_total.load(Ordering::Relaxed),
        }
    }
}

/// Mutable pool state, guarded by a single mutex.
///
/// Waiters are ordered by ticket in `waiters`; a waiter is granted a slot
/// only when it is at the front and a slot is free, which makes wakeups
/// strictly FIFO-on-release.
struct PoolState {
    in_use: u32,
    waiters: VecDeque<u64>,
    next_ticket: u64,
}

/// Blocking resource pool for preemptively scheduled threads.
///
/// `acquire` takes a free slot immediately when none are waiting, otherwise
/// joins a bounded FIFO wait queue and blocks on a [`parking_lot::Condvar`]
/// until a slot frees or the timeout elapses. Once the queue is full,
/// further callers are rejected without waiting — backpressure, not an
/// unbounded work queue.
pub struct ResourcePool {
    limits: PoolLimits,
    state: Mutex<PoolState>,
    slot_freed: Condvar,
    counters: PoolCounters,
}

impl ResourcePool {
    /// Create a pool with the given limits.
    pub fn new(limits: PoolLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(PoolState {
                in_use: 0,
                waiters: VecDeque::new(),
                next_ticket: 0,
            }),
            slot_freed: Condvar::new(),
            counters: PoolCounters::default(),
        }
    }

    /// The limits this pool was constructed with.
    pub const fn limits(&self) -> &PoolLimits {
        &self.limits
    }

    /// Attempt to take one slot, blocking up to the configured timeout.
    ///
    /// Returns `true` when a slot was granted. Returns `false` when the wait
    /// queue was already full (fast rejection, no wait) or the timeout
    /// elapsed first; in both cases the caller holds nothing and must not
    /// call [`release`](Self::release).
    pub fn acquire(&self) -> bool {
        let mut state = self.state.lock();

        // Fast path: free slot and nobody ahead of us in line.
        if state.in_use < self.limits.capacity && state.waiters.is_empty() {
            state.in_use += 1;
            self.counters.acquired_total.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        if state.waiters.len() >= self.limits.max_queue_depth {
            self.counters.rejected_total.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                capacity = self.limits.capacity,
                queued = state.waiters.len(),
                "acquire rejected: wait queue full"
            );
            return false;
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.waiters.push_back(ticket);
        tracing::debug!(ticket, queued = state.waiters.len(), "caller queued");

        let deadline = self.limits.acquire_timeout.map(|t| Instant::now() + t);
        loop {
            if state.waiters.front() == Some(&ticket) && state.in_use < self.limits.capacity {
                state.waiters.pop_front();
                state.in_use += 1;
                self.counters.acquired_total.fetch_add(1, Ordering::Relaxed);
                // The next waiter in line may also be eligible if several
                // slots freed at once.
                self.slot_freed.notify_all();
                tracing::debug!(ticket, "queued caller granted slot");
                return true;
            }

            let timed_out = match deadline {
                Some(d) => self.slot_freed.wait_until(&mut state, d).timed_out(),
                None => {
                    self.slot_freed.wait(&mut state);
                    false
                }
            };

            if timed_out {
                // Leave the line without ever having held a slot. Whoever
                // was behind us is the new front and must re-check.
                if let Some(pos) = state.waiters.iter().position(|t| *t == ticket) {
                    state.waiters.remove(pos);
                }
                self.counters.timed_out_total.fetch_add(1, Ordering::Relaxed);
                self.slot_freed.notify_all();
                tracing::debug!(ticket, "acquire timed out waiting for slot");
                return false;
            }
        }
    }

    /// Return exactly one slot to the pool and wake waiters.
    ///
    /// Calling this without a matching prior successful [`acquire`] is a
    /// caller error; the bulkhead wrapper makes the pairing structural.
    ///
    /// [`acquire`]: Self::acquire
    pub fn release(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.in_use > 0, "release without a matching acquire");
        state.in_use = state.in_use.saturating_sub(1);
        let has_waiters = !state.waiters.is_empty();
        drop(state);
        if has_waiters {
            // All waiters re-check; only the FIFO front can proceed, so at
            // most one is granted the freed slot.
            self.slot_freed.notify_all();
        }
    }

    /// Snapshot of occupancy and cumulative counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        self.counters
            .snapshot(&self.limits, state.in_use, state.waiters.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: u32, max_queue_depth: usize) -> ResourcePool {
        ResourcePool::new(PoolLimits {
            capacity,
            max_queue_depth,
            acquire_timeout: Some(Duration::from_millis(50)),
        })
    }

    #[test]
    fn acquire_up_to_capacity_never_blocks() {
        let p = pool(3, 0);
        assert!(p.acquire());
        assert!(p.acquire());
        assert!(p.acquire());
        let stats = p.stats();
        assert_eq!(stats.in_use, 3);
        assert_eq!(stats.acquired_total, 3);
    }

    #[test]
    fn zero_queue_depth_rejects_immediately() {
        let p = pool(1, 0);
        assert!(p.acquire());
        let before = Instant::now();
        assert!(!p.acquire());
        assert!(before.elapsed() < Duration::from_millis(20));
        assert_eq!(p.stats().rejected_total, 1);
    }

    #[test]
    fn timed_out_waiter_leaves_no_residue() {
        let p = pool(1, 2);
        assert!(p.acquire());
        assert!(!p.acquire());
        let stats = p.stats();
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.timed_out_total, 1);
        assert_eq!(stats.in_use, 1);
    }

    #[test]
    fn release_frees_the_slot() {
        let p = pool(1, 0);
        assert!(p.acquire());
        p.release();
        assert_eq!(p.stats().in_use, 0);
        assert!(p.acquire());
    }
}
