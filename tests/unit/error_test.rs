//! Tests for error types

use prometheus_thread_pool::core::{PoolError, TaskError, TaskPriority};

#[test]
fn test_invalid_config_error() {
    let err = PoolError::InvalidConfig("thread_name_prefix must not be empty".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: thread_name_prefix must not be empty"
    );
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = PoolError::Spawn {
        priority: TaskPriority::Normal,
        index: 0,
        source: std::io::Error::other("resource temporarily unavailable"),
    };
    assert_eq!(
        format!("{}", err),
        "failed to spawn normal priority worker #0: resource temporarily unavailable"
    );
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_task_panicked_error() {
    let err = TaskError::from_panic(Box::new("index out of range"));
    assert_eq!(format!("{}", err), "task panicked: index out of range");
}

#[test]
fn test_join_error() {
    let err = TaskError::Join("task was cancelled".to_string());
    assert_eq!(format!("{}", err), "blocking join failed: task was cancelled");
    assert_eq!(err.panic_message(), None);
}
