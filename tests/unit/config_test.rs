//! Tests for configuration validation

use prometheus_thread_pool::config::{ThreadPoolConfig, MAX_THREADS_PER_LEVEL, MIN_STACK_SIZE};
use prometheus_thread_pool::core::TaskPriority;

#[test]
fn test_config_validation() {
    let valid = ThreadPoolConfig {
        thread_count: 4,
        low_priority_thread_count: 2,
        thread_name_prefix: "terrain".to_string(),
        stack_size: Some(2 * 1024 * 1024),
    };
    assert!(valid.validate().is_ok());
    assert_eq!(valid.threads_for(TaskPriority::Normal), 4);
    assert_eq!(valid.threads_for(TaskPriority::Low), 2);
}

#[test]
fn test_config_zero_threads_allowed() {
    let cfg = ThreadPoolConfig::new()
        .with_thread_count(0)
        .with_low_priority_thread_count(0);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg, ThreadPoolConfig::synchronous());
}

#[test]
fn test_config_invalid_thread_count() {
    let invalid = ThreadPoolConfig::new().with_thread_count(MAX_THREADS_PER_LEVEL + 1);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_prefix() {
    let invalid = ThreadPoolConfig::new().with_thread_name_prefix("   ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_stack_size() {
    let invalid = ThreadPoolConfig::new().with_stack_size(MIN_STACK_SIZE - 1);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "thread_count": 6,
        "low_priority_thread_count": 0,
        "thread_name_prefix": "bvh",
        "stack_size": null
    }"#;

    let config = ThreadPoolConfig::from_json_str(json).unwrap();
    assert_eq!(config.thread_count, 6);
    assert_eq!(config.low_priority_thread_count, 0);
    assert_eq!(config.thread_name_prefix, "bvh");
    assert_eq!(config.stack_size, None);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(ThreadPoolConfig::from_json_str("{ not json").is_err());
    assert!(ThreadPoolConfig::from_json_str(r#"{ "stack_size": 16 }"#).is_err());
}

#[test]
fn test_config_json_roundtrip_keeps_fields() {
    let cfg = ThreadPoolConfig::new().with_thread_count(3).with_thread_name_prefix("resample");
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(ThreadPoolConfig::from_json_str(&json).unwrap(), cfg);
}
