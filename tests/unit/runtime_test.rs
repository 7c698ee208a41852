//! Tests for runtime facades

use prometheus_triage::config::EngineConfig;
use prometheus_triage::core::{ScoreTier, Submission, TriageEngine};
use prometheus_triage::policies::{ExplicitInputs, ExplicitPolicy};
use prometheus_triage::runtime::{health, SharedEngine};

#[test]
fn test_health_reports_waiting_and_workers() {
    let mut engine = TriageEngine::new(ExplicitPolicy, EngineConfig::default()).unwrap();
    engine.register_worker("w1", 1, Vec::<String>::new()).unwrap();
    engine
        .submit(Submission::new("a", ExplicitInputs::new(ScoreTier::Routine)))
        .unwrap();
    engine
        .submit(Submission::new("b", ExplicitInputs::new(ScoreTier::Routine)))
        .unwrap();

    let report = health(&engine);
    assert!(report.ok);
    assert_eq!(report.waiting, 1);
    assert_eq!(report.workers, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shared_engine_from_blocking_task() {
    let shared =
        SharedEngine::from(TriageEngine::new(ExplicitPolicy, EngineConfig::default()).unwrap());
    let writer = shared.clone();
    tokio::task::spawn_blocking(move || {
        writer
            .submit(Submission::new("a", ExplicitInputs::new(ScoreTier::Critical)))
            .unwrap();
    })
    .await
    .expect("blocking task");

    let snapshot = shared.dashboard();
    assert_eq!(snapshot.policy, "explicit");
    assert_eq!(snapshot.critical_alerts.len(), 1);
    assert_eq!(snapshot.queue.count, 1);
}
