//! Configuration models for bulkheads and the manager.

pub mod pool;

pub use pool::{BulkheadConfig, ManagerConfig};
