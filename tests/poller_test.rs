//! Integration tests for document-store ingestion
//!
//! Covers:
//! - Decoding source records into policy inputs
//! - Watermark advance and skipping records already handled at the watermark
//! - Rejection of undecodable records
//! - Source failures leaving the watermark untouched
//! - The periodic poll loop stopping on a watch signal

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;

use prometheus_triage::config::EngineConfig;
use prometheus_triage::core::{EntityStatus, ScoreTier, TriageEngine, TriageError};
use prometheus_triage::infra::{DocumentSource, InMemoryDocumentSource, SourceRecord};
use prometheus_triage::policies::{ExplicitPolicy, PatientPolicy};
use prometheus_triage::runtime::{IngestPoller, IngestReport, SharedEngine};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn record(id: &str, collection: &str, at_ms: u128, fields: serde_json::Value) -> SourceRecord {
    SourceRecord {
        id: id.to_string(),
        collection: collection.to_string(),
        submitted_at_ms: at_ms,
        fields,
    }
}

fn shared_engine() -> SharedEngine<ExplicitPolicy> {
    SharedEngine::new(TriageEngine::new(ExplicitPolicy, EngineConfig::default()).unwrap())
}

// ============================================================================
// SINGLE POLLS
// ============================================================================

#[tokio::test]
async fn test_poll_once_submits_new_records() {
    let source = Arc::new(InMemoryDocumentSource::new());
    source.push(record("t1", "tickets", 100, json!({ "tier": "urgent" })));
    source.push(record("t2", "tickets", 200, json!({ "tier": "critical", "urgency": 5.0 })));
    source.push(record("other", "orders", 150, json!({ "tier": "routine" })));

    let engine = shared_engine();
    let mut poller = IngestPoller::new(engine.clone(), source.clone(), "tickets", 0);
    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.accepted, 2);
    assert_eq!(poller.watermark_ms(), 200);
    assert_eq!(engine.peek_next().as_deref(), Some("t2"));

    let t1 = engine.entity("t1").unwrap();
    assert_eq!(t1.submitted_at_ms, 100);
    assert_eq!(t1.tier(), ScoreTier::Urgent);
    assert!(engine.entity("other").is_none());
}

#[tokio::test]
async fn test_records_at_watermark_are_not_ingested_twice() {
    let source = Arc::new(InMemoryDocumentSource::new());
    source.push(record("a", "q", 10, json!({ "tier": "routine" })));
    let engine = shared_engine();
    let mut poller = IngestPoller::new(engine.clone(), source.clone(), "q", 0);
    poller.poll_once().await.unwrap();

    // Same millisecond as the watermark: must not be lost.
    source.push(record("b", "q", 10, json!({ "tier": "routine" })));
    source.push(record("c", "q", 11, json!({ "tier": "routine" })));
    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.accepted, 2);
    assert_eq!(poller.watermark_ms(), 11);
    assert_eq!(engine.queue_stats().count, 3);

    let idle = poller.poll_once().await.unwrap();
    assert_eq!(idle, IngestReport::default());
}

#[tokio::test]
async fn test_bad_record_at_watermark_is_rejected_once() {
    let source = Arc::new(InMemoryDocumentSource::new());
    source.push(record("good", "q", 5, json!({ "tier": "urgent" })));
    source.push(record("bad", "q", 5, json!({ "tier": "whenever" })));

    let engine = shared_engine();
    let mut poller = IngestPoller::new(engine.clone(), source, "q", 0);
    let mut total = IngestReport::default();
    for _ in 0..3 {
        total += poller.poll_once().await.unwrap();
    }

    assert_eq!(total.fetched, 2);
    assert_eq!(total.accepted, 1);
    assert_eq!(total.rejected, 1);
    assert_eq!(total.duplicates, 0);
    assert_eq!(poller.watermark_ms(), 5);
    assert!(engine.entity("bad").is_none());
}

#[tokio::test]
async fn test_undecodable_records_are_rejected() {
    let source = Arc::new(InMemoryDocumentSource::new());
    source.push(record("bad", "q", 1, json!({ "tier": "whenever" })));
    source.push(record("good", "q", 2, json!({ "tier": "emergency" })));

    let engine = shared_engine();
    let mut poller = IngestPoller::new(engine.clone(), source, "q", 0);
    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.rejected, 1);
    assert_eq!(report.accepted, 1);
    assert!(engine.entity("bad").is_none());
    assert_eq!(poller.watermark_ms(), 2);
}

#[tokio::test]
async fn test_source_failure_keeps_watermark() {
    let source = Arc::new(InMemoryDocumentSource::new());
    source.push(record("a", "q", 50, json!({ "tier": "routine" })));
    source.fail_next("connection reset");

    let mut poller = IngestPoller::new(shared_engine(), source.clone(), "q", 5);
    let err = poller.poll_once().await.unwrap_err();
    assert!(matches!(err, TriageError::Source(ref reason) if reason == "connection reset"));
    assert_eq!(poller.watermark_ms(), 5);

    let report = poller.poll_once().await.unwrap();
    assert_eq!(report.accepted, 1);
}

#[tokio::test]
async fn test_patient_records_are_triaged_by_policy() {
    let source: Arc<dyn DocumentSource> = {
        let memory = InMemoryDocumentSource::new();
        memory.push(record(
            "p1",
            "patients",
            1,
            json!({
                "age": 40,
                "chief_complaint": "sprained ankle",
                "vitals": { "pain_scale": 4 }
            }),
        ));
        memory.push(record("p2", "patients", 2, json!({ "trauma_alert": true })));
        Arc::new(memory)
    };
    let engine = SharedEngine::new(
        TriageEngine::new(PatientPolicy::default(), EngineConfig::default()).unwrap(),
    );
    engine.register_worker("dr-a", 1, vec![]).unwrap();

    let mut poller = IngestPoller::new(engine.clone(), source, "patients", 0);
    poller.poll_once().await.unwrap();

    // p1 arrived first and took the only doctor.
    assert_eq!(engine.entity("p1").unwrap().status, EntityStatus::Assigned);
    assert_eq!(engine.entity("p1").unwrap().tier(), ScoreTier::SemiUrgent);
    assert_eq!(engine.entity("p2").unwrap().tier(), ScoreTier::Critical);
    assert_eq!(engine.dashboard().critical_alerts.len(), 1);
}

// ============================================================================
// POLL LOOP
// ============================================================================

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let source = Arc::new(InMemoryDocumentSource::new());
    source.push(record("a", "q", 1, json!({ "tier": "urgent" })));
    source.push(record("b", "q", 2, json!({ "tier": "urgent" })));

    let engine = shared_engine();
    let poller = IngestPoller::new(engine.clone(), source, "q", 0);
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(poller.run(Duration::from_millis(10), rx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();
    let total = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(total.accepted, 2);
    assert_eq!(total.fetched, 2);
    assert_eq!(total.duplicates, 0);
    assert_eq!(total.rejected, 0);
    assert_eq!(engine.queue_stats().count, 2);
}

#[tokio::test]
async fn test_run_stops_when_sender_dropped() {
    let source = Arc::new(InMemoryDocumentSource::new());
    let poller = IngestPoller::new(shared_engine(), source, "q", 0);
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(poller.run(Duration::from_millis(5), rx));
    drop(tx);

    let total = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(total.accepted, 0);
}
