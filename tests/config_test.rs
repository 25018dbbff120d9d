//! Configuration validation, JSON parsing, and the manager builder.

use std::collections::HashMap;
use std::sync::Arc;

use bulkhead_pool::builders::build_manager;
use bulkhead_pool::config::{BulkheadConfig, ManagerConfig};
use bulkhead_pool::core::{InMemoryEventSink, PoolMode};

fn one_bulkhead(max_concurrent: u32) -> ManagerConfig {
    let mut bulkheads = HashMap::new();
    bulkheads.insert(
        "db".to_string(),
        BulkheadConfig {
            max_concurrent,
            max_queue_depth: 8,
            acquire_timeout_ms: Some(250),
            mode: PoolMode::Blocking,
        },
    );
    ManagerConfig { bulkheads }
}

#[test]
fn manager_config_requires_at_least_one_bulkhead() {
    let empty = ManagerConfig {
        bulkheads: HashMap::new(),
    };
    assert!(empty.validate().is_err());
    assert!(one_bulkhead(4).validate().is_ok());
}

#[test]
fn invalid_bulkhead_is_reported_with_its_name() {
    let err = one_bulkhead(0).validate().unwrap_err();
    assert!(err.contains("db"));
    assert!(err.contains("max_concurrent"));
}

#[cfg(feature = "tokio-runtime")]
#[test]
fn config_parses_from_json() {
    let json = r#"{
        "bulkheads": {
            "db": {
                "max_concurrent": 10,
                "max_queue_depth": 50,
                "acquire_timeout_ms": 2000,
                "mode": "blocking"
            },
            "inference": {
                "max_concurrent": 2,
                "max_queue_depth": 4,
                "acquire_timeout_ms": null,
                "mode": "cooperative"
            }
        }
    }"#;

    let cfg = ManagerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.bulkheads["db"].max_concurrent, 10);
    assert_eq!(cfg.bulkheads["inference"].mode, PoolMode::Cooperative);
    assert_eq!(cfg.bulkheads["inference"].acquire_timeout_ms, None);
}

#[test]
fn malformed_or_invalid_json_is_rejected() {
    assert!(ManagerConfig::from_json_str("{not json").is_err());

    let zero_capacity = r#"{
        "bulkheads": {
            "db": {
                "max_concurrent": 0,
                "max_queue_depth": 8,
                "acquire_timeout_ms": null,
                "mode": "blocking"
            }
        }
    }"#;
    assert!(ManagerConfig::from_json_str(zero_capacity).is_err());
}

#[test]
fn build_manager_registers_each_configured_bulkhead() {
    let sink = Arc::new(InMemoryEventSink::new(16));
    let manager = build_manager(&one_bulkhead(4), Some(sink.clone())).unwrap();

    let bulkhead = manager.get_bulkhead("db").unwrap();
    assert_eq!(bulkhead.status().pool.capacity, 4);

    // Bulkheads built from config emit to the supplied sink.
    bulkhead.execute(|| Ok::<_, String>(())).unwrap();
    assert_eq!(
        sink.kinds(),
        vec!["bulkhead.acquired", "bulkhead.completed", "bulkhead.released"]
    );
}

#[test]
fn build_manager_rejects_invalid_config() {
    let err = build_manager(&one_bulkhead(0), None).unwrap_err();
    assert!(err.to_string().contains("invalid"));
}
