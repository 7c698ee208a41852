//! Tests for builder modules

use std::sync::Arc;

use prometheus_triage::builders::EngineBuilder;
use prometheus_triage::config::{EngineConfig, WorkerConfig};
use prometheus_triage::core::{AuditAction, InMemoryAuditSink, ScoreTier, Submission};
use prometheus_triage::policies::{ExplicitInputs, ExplicitPolicy};
use prometheus_triage::util::ManualClock;

#[test]
fn test_engine_builder_defaults() {
    let engine = EngineBuilder::new(ExplicitPolicy).build().unwrap();
    assert_eq!(engine.config(), &EngineConfig::default());
    assert!(engine.workload().is_empty());
    assert_eq!(engine.queue_stats().count, 0);
}

#[test]
fn test_engine_builder_wires_clock_audit_and_workers() {
    let audit = InMemoryAuditSink::shared(16);
    let config = EngineConfig {
        workers: vec![WorkerConfig {
            id: "w1".to_string(),
            capacity: 2,
            tags: vec![],
        }],
        ..EngineConfig::default()
    };
    let mut engine = EngineBuilder::new(ExplicitPolicy)
        .config(config)
        .clock(Arc::new(ManualClock::new(77)))
        .audit(Box::new(audit.clone()))
        .build()
        .unwrap();

    let receipt = engine
        .submit(Submission::new("a", ExplicitInputs::new(ScoreTier::Urgent)))
        .unwrap();
    assert_eq!(receipt.assigned_worker.as_deref(), Some("w1"));
    assert_eq!(engine.entity("a").unwrap().submitted_at_ms, 77);

    let actions: Vec<AuditAction> = audit.lock().events().iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Submitted, AuditAction::Assigned]);
}

#[test]
fn test_engine_builder_rejects_invalid_config() {
    let config = EngineConfig {
        workers: vec![WorkerConfig {
            id: "w1".to_string(),
            capacity: 0,
            tags: vec![],
        }],
        ..EngineConfig::default()
    };
    assert!(EngineBuilder::new(ExplicitPolicy).config(config).build().is_err());
}
