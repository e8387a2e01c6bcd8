//! Tests for audit sinks

use std::sync::Arc;

use parking_lot::Mutex;
use sync_scheduler::core::{
    build_audit_event, AuditAction, AuditSink, InMemoryAuditSink, Priority, TaskId,
    TracingAuditSink,
};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let id = TaskId::new();

    sink.record(build_audit_event(
        id,
        AuditAction::Failed,
        Priority::High,
        3,
        Some("boom".to_string()),
    ));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].task_id, id);
    assert_eq!(events[0].action, AuditAction::Failed);
    assert_eq!(events[0].priority, Priority::High);
    assert_eq!(events[0].retry_count, 3);
    assert_eq!(events[0].detail.as_deref(), Some("boom"));
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_shared_sink_is_visible_through_clone() {
    let shared = Arc::new(Mutex::new(InMemoryAuditSink::new(10)));
    let mut writer = Arc::clone(&shared);
    writer.record(build_audit_event(
        TaskId::new(),
        AuditAction::Submitted,
        Priority::Low,
        0,
        None,
    ));
    assert_eq!(shared.lock().events().len(), 1);
}

#[test]
fn test_zero_capacity_sink_records_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(
        TaskId::new(),
        AuditAction::Started,
        Priority::Medium,
        0,
        None,
    ));
    assert!(sink.events().is_empty());
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingAuditSink;
    sink.record(build_audit_event(
        TaskId::new(),
        AuditAction::RetryScheduled,
        Priority::Medium,
        1,
        Some("timeout".to_string()),
    ));
}

#[test]
fn test_audit_event_json_shape() {
    let event = build_audit_event(
        TaskId::new(),
        AuditAction::RetryScheduled,
        Priority::Low,
        1,
        None,
    );
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "retry_scheduled");
    assert_eq!(json["priority"], "low");
    assert_eq!(json["retry_count"], 1);
}
