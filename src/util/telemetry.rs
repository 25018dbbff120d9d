//! Tracing bootstrap.

use tracing_subscriber::EnvFilter;

/// Install a process-wide `tracing` subscriber filtered by `RUST_LOG`.
///
/// A no-op when a dispatcher is already registered, so embedders keep
/// whatever subscriber they installed and repeated calls (concurrent test
/// binaries included) are safe.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
