//! Error types for bulkhead operations.

use thiserror::Error;

use super::bulkhead::PoolMode;

/// Errors produced when executing work through a bulkhead.
///
/// `E` is the caller's own error type: a protected operation that fails is
/// surfaced unchanged through [`BulkheadError::Inner`], never wrapped in an
/// opaque box or swallowed.
#[derive(Debug, Error)]
pub enum BulkheadError<E> {
    /// No slot could be acquired: the wait queue was full, or the wait
    /// timed out before a slot freed.
    #[error(
        "bulkhead `{name}` at capacity: {capacity} slots in use, wait queue (depth {max_queue_depth}) full or timed out"
    )]
    CapacityExhausted {
        /// Name of the rejecting bulkhead.
        name: String,
        /// Configured slot capacity.
        capacity: u32,
        /// Configured wait-queue bound.
        max_queue_depth: usize,
    },
    /// A blocking call was made against a cooperative pool, or vice versa.
    /// This is a programming error and is never silently degraded.
    #[error("bulkhead `{name}` is bound to a {actual} pool, but a {expected} call was made")]
    ModeMismatch {
        /// Name of the bulkhead.
        name: String,
        /// Mode the call required.
        expected: PoolMode,
        /// Mode the bulkhead is actually bound to.
        actual: PoolMode,
    },
    /// The protected work itself failed. The slot was released and a
    /// `failed` event emitted before this was returned.
    #[error("protected operation failed: {0}")]
    Inner(E),
}

impl<E> BulkheadError<E> {
    /// Extracts the caller's original error, if this is an [`Inner`] failure.
    ///
    /// [`Inner`]: BulkheadError::Inner
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this error is a capacity rejection (retry is the
    /// caller's decision; the bulkhead never retries internally).
    pub const fn is_capacity_exhausted(&self) -> bool {
        matches!(self, Self::CapacityExhausted { .. })
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
