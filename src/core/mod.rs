//! Core pool, bulkhead, manager, and event abstractions.

pub mod error;
pub mod events;
pub mod pool;
pub mod bulkhead;
pub mod manager;

#[cfg(feature = "tokio-runtime")]
pub mod async_pool;

pub use error::{AppResult, BulkheadError};
pub use events::{BulkheadEvent, EventSink, InMemoryEventSink};
pub use pool::{PoolCounters, PoolLimits, PoolStats, ResourcePool};
pub use bulkhead::{Bulkhead, BulkheadStatus, PoolHandle, PoolMode};
pub use manager::{default_manager, BulkheadManager};

#[cfg(feature = "tokio-runtime")]
pub use async_pool::AsyncResourcePool;
