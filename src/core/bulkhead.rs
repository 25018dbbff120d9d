//! Bulkhead: binds one named protected operation to exactly one pool.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::error::BulkheadError;
use super::events::{BulkheadEvent, EventSink};
use super::pool::{PoolLimits, PoolStats, ResourcePool};

#[cfg(feature = "tokio-runtime")]
use super::async_pool::AsyncResourcePool;

/// Which scheduling model a bulkhead's pool belongs to, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    /// Preemptive threads; `acquire` may block the calling thread.
    Blocking,
    /// Tokio tasks; `acquire` suspends the calling task.
    #[cfg(feature = "tokio-runtime")]
    Cooperative,
}

impl fmt::Display for PoolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => f.write_str("blocking"),
            #[cfg(feature = "tokio-runtime")]
            Self::Cooperative => f.write_str("cooperative"),
        }
    }
}

/// The one pool a bulkhead is bound to. A closed two-variant set: cross-mode
/// calls are rejected up front instead of dispatched to the wrong model.
pub enum PoolHandle {
    /// Blocking pool for preemptive threads.
    Blocking(Arc<ResourcePool>),
    /// Cooperative pool for tokio tasks.
    #[cfg(feature = "tokio-runtime")]
    Cooperative(Arc<AsyncResourcePool>),
}

/// Status snapshot of one bulkhead, suitable for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkheadStatus {
    /// Bulkhead name.
    pub name: String,
    /// Scheduling model of the bound pool.
    pub mode: PoolMode,
    /// Pool occupancy and counters. Zeroed when the snapshot was requested
    /// for the mode the bulkhead is not bound to.
    pub pool: PoolStats,
}

/// An isolation boundary limiting concurrent use of a named protected
/// operation.
///
/// A bulkhead owns exactly one pool (blocking or cooperative, chosen at
/// construction) and wraps caller-supplied work with guaranteed
/// acquire/execute/release plus lifecycle notifications. Release is
/// structural: a scope guard returns the slot on every exit path, so one
/// successful acquire always pairs with exactly one release.
pub struct Bulkhead {
    name: String,
    pool: PoolHandle,
    sink: Option<Arc<dyn EventSink>>,
}

impl Bulkhead {
    /// Create a bulkhead bound to a fresh blocking pool.
    pub fn blocking(name: impl Into<String>, limits: PoolLimits) -> Self {
        Self {
            name: name.into(),
            pool: PoolHandle::Blocking(Arc::new(ResourcePool::new(limits))),
            sink: None,
        }
    }

    /// Create a bulkhead bound to a fresh cooperative pool.
    #[cfg(feature = "tokio-runtime")]
    pub fn cooperative(name: impl Into<String>, limits: PoolLimits) -> Self {
        Self {
            name: name.into(),
            pool: PoolHandle::Cooperative(Arc::new(AsyncResourcePool::new(limits))),
            sink: None,
        }
    }

    /// Attach a lifecycle event sink. Emission is best-effort; sink failures
    /// never alter execution outcomes.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// This bulkhead's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scheduling model this bulkhead is bound to.
    pub fn mode(&self) -> PoolMode {
        match self.pool {
            PoolHandle::Blocking(_) => PoolMode::Blocking,
            #[cfg(feature = "tokio-runtime")]
            PoolHandle::Cooperative(_) => PoolMode::Cooperative,
        }
    }

    /// Run `work` inside the bulkhead on the blocking pool.
    ///
    /// Fails immediately with [`BulkheadError::ModeMismatch`] when the
    /// bulkhead is bound to a cooperative pool, and with
    /// [`BulkheadError::CapacityExhausted`] when no slot could be acquired.
    /// The work's own error is re-raised unchanged as
    /// [`BulkheadError::Inner`] after the slot is released and a `failed`
    /// event emitted.
    pub fn execute<T, E, F>(&self, work: F) -> Result<T, BulkheadError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let pool = match &self.pool {
            PoolHandle::Blocking(pool) => pool,
            #[cfg(feature = "tokio-runtime")]
            PoolHandle::Cooperative(_) => return Err(self.mode_mismatch(PoolMode::Blocking)),
        };

        if !pool.acquire() {
            return Err(self.capacity_exhausted(pool.limits()));
        }
        let _slot = SlotGuard { bulkhead: self };

        self.emit(BulkheadEvent::acquired(&self.name, pool.stats()));
        let start = Instant::now();
        match work() {
            Ok(value) => {
                self.emit(BulkheadEvent::completed(
                    &self.name,
                    pool.stats(),
                    start.elapsed(),
                ));
                Ok(value)
            }
            Err(err) => {
                self.emit(BulkheadEvent::failed(
                    &self.name,
                    pool.stats(),
                    start.elapsed(),
                    err.to_string(),
                ));
                Err(BulkheadError::Inner(err))
            }
        }
    }

    /// Run `work` inside the bulkhead on the cooperative pool.
    ///
    /// The contract of [`execute`](Self::execute), with acquisition and the
    /// work itself as suspension points. The work future is only created
    /// after a slot is granted. If the returned future is dropped mid-work,
    /// the slot is still released.
    #[cfg(feature = "tokio-runtime")]
    pub async fn execute_async<T, E, F, Fut>(&self, work: F) -> Result<T, BulkheadError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let pool = match &self.pool {
            PoolHandle::Cooperative(pool) => pool,
            PoolHandle::Blocking(_) => return Err(self.mode_mismatch(PoolMode::Cooperative)),
        };

        if !pool.acquire().await {
            return Err(self.capacity_exhausted(pool.limits()));
        }
        let _slot = SlotGuard { bulkhead: self };

        self.emit(BulkheadEvent::acquired(&self.name, pool.stats()));
        let start = Instant::now();
        match work().await {
            Ok(value) => {
                self.emit(BulkheadEvent::completed(
                    &self.name,
                    pool.stats(),
                    start.elapsed(),
                ));
                Ok(value)
            }
            Err(err) => {
                self.emit(BulkheadEvent::failed(
                    &self.name,
                    pool.stats(),
                    start.elapsed(),
                    err.to_string(),
                ));
                Err(BulkheadError::Inner(err))
            }
        }
    }

    /// Status snapshot for the blocking mode. A cooperative bulkhead
    /// reports zeroed pool stats here rather than a cross-mode read.
    pub fn status(&self) -> BulkheadStatus {
        let pool = match &self.pool {
            PoolHandle::Blocking(pool) => pool.stats(),
            #[cfg(feature = "tokio-runtime")]
            PoolHandle::Cooperative(_) => PoolStats::default(),
        };
        BulkheadStatus {
            name: self.name.clone(),
            mode: self.mode(),
            pool,
        }
    }

    /// Status snapshot for the cooperative mode; the counterpart of
    /// [`status`](Self::status). Not a suspension point — the name marks
    /// which pool variant it reads. A blocking bulkhead reports zeroed
    /// pool stats here.
    #[cfg(feature = "tokio-runtime")]
    pub fn status_async(&self) -> BulkheadStatus {
        let pool = match &self.pool {
            PoolHandle::Cooperative(pool) => pool.stats(),
            PoolHandle::Blocking(_) => PoolStats::default(),
        };
        BulkheadStatus {
            name: self.name.clone(),
            mode: self.mode(),
            pool,
        }
    }

    fn capacity_exhausted<E>(&self, limits: &PoolLimits) -> BulkheadError<E> {
        BulkheadError::CapacityExhausted {
            name: self.name.clone(),
            capacity: limits.capacity,
            max_queue_depth: limits.max_queue_depth,
        }
    }

    #[cfg(feature = "tokio-runtime")]
    fn mode_mismatch<E>(&self, expected: PoolMode) -> BulkheadError<E> {
        tracing::error!(
            bulkhead = %self.name,
            %expected,
            actual = %self.mode(),
            "cross-mode call rejected"
        );
        BulkheadError::ModeMismatch {
            name: self.name.clone(),
            expected,
            actual: self.mode(),
        }
    }

    /// Deliver an event to the sink, discarding sink errors and panics.
    fn emit(&self, event: BulkheadEvent) {
        let Some(sink) = &self.sink else { return };
        match catch_unwind(AssertUnwindSafe(|| sink.record(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(kind = event.kind(), error = %err, "event sink failed; discarding");
            }
            Err(_) => {
                tracing::debug!(kind = event.kind(), "event sink panicked; discarding");
            }
        }
    }

    fn release_slot(&self) {
        match &self.pool {
            PoolHandle::Blocking(pool) => pool.release(),
            #[cfg(feature = "tokio-runtime")]
            PoolHandle::Cooperative(pool) => pool.release(),
        }
    }

    fn pool_stats(&self) -> PoolStats {
        match &self.pool {
            PoolHandle::Blocking(pool) => pool.stats(),
            #[cfg(feature = "tokio-runtime")]
            PoolHandle::Cooperative(pool) => pool.stats(),
        }
    }
}

/// Releases the held slot exactly once on every exit path, then emits
/// `released`. The release itself runs first, so a sink failure can never
/// keep a slot occupied.
struct SlotGuard<'a> {
    bulkhead: &'a Bulkhead,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.bulkhead.release_slot();
        self.bulkhead.emit(BulkheadEvent::released(
            &self.bulkhead.name,
            self.bulkhead.pool_stats(),
        ));
    }
}
