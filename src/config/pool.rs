//! Bulkhead and manager configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::bulkhead::PoolMode;

/// Configuration for one bulkhead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkheadConfig {
    /// Maximum concurrent slots.
    pub max_concurrent: u32,
    /// Maximum callers allowed to wait at once; zero rejects as soon as all
    /// slots are busy.
    pub max_queue_depth: usize,
    /// Maximum wait in milliseconds before rejection. `None` waits
    /// indefinitely.
    pub acquire_timeout_ms: Option<u64>,
    /// Scheduling model of the bound pool.
    pub mode: PoolMode,
}

impl BulkheadConfig {
    /// The wait timeout as a [`Duration`], if bounded.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        Ok(())
    }
}

impl Default for BulkheadConfig {
    /// Blocking bulkhead sized to the host: one slot per logical CPU, a
    /// wait queue of 64, and a 30 second wait bound.
    fn default() -> Self {
        Self {
            max_concurrent: u32::try_from(num_cpus::get()).unwrap_or(1).max(1),
            max_queue_depth: 64,
            acquire_timeout_ms: Some(30_000),
            mode: PoolMode::Blocking,
        }
    }
}

/// Root manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Map of bulkhead name to configuration.
    pub bulkheads: HashMap<String, BulkheadConfig>,
}

impl ManagerConfig {
    /// Validate all bulkheads and ensure at least one is defined.
    pub fn validate(&self) -> Result<(), String> {
        if self.bulkheads.is_empty() {
            return Err("at least one bulkhead must be defined".into());
        }
        for (name, bulkhead) in &self.bulkheads {
            bulkhead
                .validate()
                .map_err(|e| format!("bulkhead `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse manager configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = BulkheadConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.max_concurrent >= 1);
        assert_eq!(cfg.mode, PoolMode::Blocking);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = BulkheadConfig {
            max_concurrent: 0,
            ..BulkheadConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn timeout_converts_to_duration() {
        let cfg = BulkheadConfig {
            acquire_timeout_ms: Some(1_500),
            ..BulkheadConfig::default()
        };
        assert_eq!(cfg.acquire_timeout(), Some(Duration::from_millis(1_500)));

        let unbounded = BulkheadConfig {
            acquire_timeout_ms: None,
            ..BulkheadConfig::default()
        };
        assert_eq!(unbounded.acquire_timeout(), None);
    }
}
