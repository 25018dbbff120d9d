//! Guarded registry mapping bulkhead names to shared [`Bulkhead`] instances.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::bulkhead::{Bulkhead, BulkheadStatus, PoolMode};
use super::events::EventSink;
use super::pool::PoolLimits;
use crate::config::BulkheadConfig;

/// Registry of named bulkheads with idempotent creation.
///
/// One map, one exclusion lock. Creation and removal are mutually exclusive
/// with each other but independent of pool-level locking, so registry
/// operations never contend with in-flight executions.
///
/// Construct managers freely — tests should use isolated instances — or use
/// the process-wide [`default_manager`] for convenience.
#[derive(Default)]
pub struct BulkheadManager {
    bulkheads: Mutex<HashMap<String, Arc<Bulkhead>>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for BulkheadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkheadManager").finish_non_exhaustive()
    }
}

impl BulkheadManager {
    /// Create an empty registry with no event sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose bulkheads emit lifecycle events to
    /// `sink`.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            bulkheads: Mutex::new(HashMap::new()),
            sink: Some(sink),
        }
    }

    /// Create (or return the existing) bulkhead registered under `name`.
    ///
    /// Idempotent under the registry lock: the first registration wins, and
    /// the parameters of any later call for the same name are silently
    /// ignored. Check-and-insert is atomic with respect to concurrent
    /// callers creating the same name.
    pub fn create_bulkhead(&self, name: impl Into<String>, config: &BulkheadConfig) -> Arc<Bulkhead> {
        let name = name.into();
        let mut bulkheads = self.bulkheads.lock();
        if let Some(existing) = bulkheads.get(&name) {
            tracing::debug!(bulkhead = %name, "create ignored: name already registered");
            return Arc::clone(existing);
        }

        let limits = PoolLimits {
            capacity: config.max_concurrent,
            max_queue_depth: config.max_queue_depth,
            acquire_timeout: config.acquire_timeout(),
        };
        let mut bulkhead = match config.mode {
            PoolMode::Blocking => Bulkhead::blocking(name.clone(), limits),
            #[cfg(feature = "tokio-runtime")]
            PoolMode::Cooperative => Bulkhead::cooperative(name.clone(), limits),
        };
        if let Some(sink) = &self.sink {
            bulkhead = bulkhead.with_sink(Arc::clone(sink));
        }

        tracing::info!(
            bulkhead = %name,
            mode = %config.mode,
            capacity = config.max_concurrent,
            max_queue_depth = config.max_queue_depth,
            "bulkhead registered"
        );
        let bulkhead = Arc::new(bulkhead);
        bulkheads.insert(name, Arc::clone(&bulkhead));
        bulkhead
    }

    /// Look up a registered bulkhead by name.
    pub fn get_bulkhead(&self, name: &str) -> Option<Arc<Bulkhead>> {
        self.bulkheads.lock().get(name).map(Arc::clone)
    }

    /// Names of all registered bulkheads, in no particular order.
    pub fn list_bulkheads(&self) -> Vec<String> {
        self.bulkheads.lock().keys().cloned().collect()
    }

    /// Remove the bulkhead registered under `name`.
    ///
    /// Returns `true` if it existed and was removed. A miss returns `false`
    /// and leaves the registry unchanged. Callers still holding the
    /// [`Arc<Bulkhead>`] keep a working bulkhead; removal only unregisters
    /// the name.
    pub fn remove_bulkhead(&self, name: &str) -> bool {
        let removed = self.bulkheads.lock().remove(name).is_some();
        if removed {
            tracing::info!(bulkhead = %name, "bulkhead removed");
        }
        removed
    }

    /// Status snapshots for every registered bulkhead.
    ///
    /// The map is walked under the registry lock, but each status call may
    /// race with in-flight acquire/release on other threads — the result is
    /// eventually consistent, not transactional.
    pub fn all_status(&self) -> HashMap<String, BulkheadStatus> {
        let bulkheads: Vec<Arc<Bulkhead>> = self.bulkheads.lock().values().map(Arc::clone).collect();
        bulkheads
            .into_iter()
            .map(|b| {
                // Read through the accessor matching each bulkhead's mode so
                // the aggregate never contains cross-mode zeroes.
                let status = match b.mode() {
                    PoolMode::Blocking => b.status(),
                    #[cfg(feature = "tokio-runtime")]
                    PoolMode::Cooperative => b.status_async(),
                };
                (b.name().to_string(), status)
            })
            .collect()
    }
}

static DEFAULT_MANAGER: OnceLock<BulkheadManager> = OnceLock::new();

/// The process-wide default manager, created on first use with no sink.
///
/// Every operation works identically on an independently constructed
/// [`BulkheadManager`]; prefer isolated instances in tests.
pub fn default_manager() -> &'static BulkheadManager {
    DEFAULT_MANAGER.get_or_init(BulkheadManager::new)
}
