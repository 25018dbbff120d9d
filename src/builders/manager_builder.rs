//! Build a populated [`BulkheadManager`] from configuration.

use std::sync::Arc;

use crate::config::ManagerConfig;
use crate::core::{AppResult, BulkheadManager, EventSink};

/// Build a manager with one registered bulkhead per configured entry.
///
/// The configuration is validated first; every bulkhead created from it
/// emits lifecycle events to `sink` when one is supplied.
pub fn build_manager(
    cfg: &ManagerConfig,
    sink: Option<Arc<dyn EventSink>>,
) -> AppResult<BulkheadManager> {
    cfg.validate()
        .map_err(|e| anyhow::anyhow!("manager config invalid: {e}"))?;

    let manager = match sink {
        Some(sink) => BulkheadManager::with_sink(sink),
        None => BulkheadManager::new(),
    };
    for (name, bulkhead_cfg) in &cfg.bulkheads {
        manager.create_bulkhead(name.clone(), bulkhead_cfg);
    }
    Ok(manager)
}
