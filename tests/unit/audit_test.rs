//! Tests for audit sink

use prometheus_triage::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        "entity1",
        Some("worker1".to_string()),
        AuditAction::Assigned,
        Some(42),
        Some("immediate".to_string()),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0], event);
    assert_eq!(events[0].entity_id, "entity1");
    assert_eq!(events[0].action, AuditAction::Assigned);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("e1", None, AuditAction::Submitted, None, None));
    sink.record(build_audit_event("e2", None, AuditAction::Submitted, None, None));
    sink.record(build_audit_event("e3", None, AuditAction::Submitted, None, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].entity_id, "e2"); // First one popped
    assert_eq!(events[1].entity_id, "e3");
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(
        "entity1",
        None,
        AuditAction::Completed,
        None,
        Some("done".to_string()),
    );

    assert_eq!(event.event_id.len(), 36);
    assert_eq!(event.worker_id, None);
    assert_eq!(event.action.to_string(), "completed");
    assert_eq!(event.detail, Some("done".to_string()));
    assert!(event.created_at_ms > 0);
}

#[test]
fn test_shared_sink_filters_by_entity() {
    let shared = InMemoryAuditSink::shared(8);
    let mut writer = shared.clone();
    writer.record(build_audit_event("a", None, AuditAction::Submitted, Some(1), None));
    writer.record(build_audit_event("b", None, AuditAction::Submitted, Some(2), None));
    writer.record(build_audit_event("a", None, AuditAction::Cancelled, Some(3), None));

    let trail: Vec<AuditAction> = shared.lock().events_for("a").iter().map(|e| e.action).collect();
    assert_eq!(trail, vec![AuditAction::Submitted, AuditAction::Cancelled]);
}
