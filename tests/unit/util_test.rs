//! Tests for priorities and telemetry helpers

use prometheus_thread_pool::core::{TaskPriority, TaskStatus};
use prometheus_thread_pool::util::{init_tracing, DEFAULT_DIRECTIVE};

#[test]
fn test_priority_ordering() {
    assert!(TaskPriority::Normal > TaskPriority::Low);
    assert_eq!(TaskPriority::default(), TaskPriority::Normal);
    assert_eq!(TaskPriority::ALL, [TaskPriority::Low, TaskPriority::Normal]);
}

#[test]
fn test_priority_display() {
    assert_eq!(TaskPriority::Low.to_string(), "low");
    assert_eq!(TaskPriority::Normal.as_str(), "normal");
}

#[test]
fn test_priority_serde() {
    let json = serde_json::to_string(&TaskPriority::Low).unwrap();
    assert_eq!(json, "\"low\"");
    let parsed: TaskPriority = serde_json::from_str("\"normal\"").unwrap();
    assert_eq!(parsed, TaskPriority::Normal);
}

#[test]
fn test_task_status_serde() {
    let json = serde_json::to_string(&TaskStatus::Canceled).unwrap();
    assert_eq!(json, "\"canceled\"");
}

#[test]
fn test_init_tracing_is_idempotent() {
    assert!(DEFAULT_DIRECTIVE.starts_with("prometheus_thread_pool"));
    init_tracing();
    init_tracing();
}
