//! # Bulkhead Pool
//!
//! Bulkhead isolation primitives: bounded resource pools with admission control.
//!
//! A bulkhead caps the number of concurrent uses of a protected operation so
//! that overload or failure in one call path cannot exhaust the resources
//! needed by others — named after the ship compartments that stop flooding
//! from spreading. This library provides the full isolation stack: capacity
//! accounting, a bounded wait queue with fast rejection, scoped
//! acquire/execute/release, and a named registry for aggregate status.
//!
//! ## Core Problem Solved
//!
//! Shared downstream resources (database handles, GPU slots, third-party
//! APIs) fail badly when every caller is allowed to pile on:
//!
//! - **Resource exhaustion**: one slow dependency absorbs every worker thread
//! - **Unbounded queues**: latency grows without bound instead of shedding load
//! - **Cascading failure**: a single overloaded path takes unrelated paths down
//! - **Leaked slots**: error paths that skip the release step starve the pool
//!
//! ## Key Features
//!
//! - **Two pool models**: a blocking `ResourcePool` for preemptive threads
//!   and a cooperative `AsyncResourcePool` for tokio tasks
//! - **Admission control**: a bounded wait queue that rejects fast once full,
//!   rather than accepting unbounded work
//! - **FIFO wakeups**: waiters are granted slots strictly in arrival order
//! - **Scoped release**: `Bulkhead` releases the slot on every exit path,
//!   including caller errors in the protected work
//! - **Lifecycle events**: best-effort notifications (`acquired`, `completed`,
//!   `failed`, `released`) through an injected `EventSink`
//! - **Named registry**: `BulkheadManager` with idempotent creation and
//!   aggregate status snapshots
//!
//! ## Bulkhead - Protecting an Operation
//!
//! ```rust,ignore
//! use bulkhead_pool::config::BulkheadConfig;
//! use bulkhead_pool::core::{BulkheadManager, PoolMode};
//!
//! let manager = BulkheadManager::new();
//! let bulkhead = manager.create_bulkhead(
//!     "database",
//!     &BulkheadConfig {
//!         max_concurrent: 10,
//!         max_queue_depth: 50,
//!         acquire_timeout_ms: Some(2_000),
//!         mode: PoolMode::Blocking,
//!     },
//! );
//!
//! let rows = bulkhead.execute(|| query_orders())?;
//! ```
//!
//! ## Cooperative Pools
//!
//! With the default `tokio-runtime` feature, the same contract is available
//! as suspension points inside a tokio runtime:
//!
//! ```rust,ignore
//! let output = bulkhead.execute_async(|| run_inference(prompt)).await?;
//! ```
//!
//! For complete examples, see:
//! - `tests/bulkhead_test.rs` - Full execution lifecycle tests
//! - `tests/pool_test.rs` - Pool admission-control tests

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core pool, bulkhead, manager, and event abstractions.
pub mod core;
/// Configuration models for bulkheads and the manager.
pub mod config;
/// Builders to construct a manager from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
