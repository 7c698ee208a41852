//! Tests for error types

use prometheus_triage::core::{AppResult, TriageError};

#[test]
fn test_duplicate_entity_error() {
    let err = TriageError::DuplicateEntity("p1".to_string());
    assert_eq!(format!("{}", err), "duplicate entity: p1");
}

#[test]
fn test_capacity_below_load_error() {
    let err = TriageError::CapacityBelowLoad {
        worker: "w1".to_string(),
        capacity: 1,
        load: 3,
    };
    assert_eq!(format!("{}", err), "worker `w1` capacity 1 is below current load 3");
}

#[test]
fn test_engine_stopped_error() {
    let err = TriageError::EngineStopped;
    assert_eq!(format!("{}", err), "engine stopped");
}

#[test]
fn test_source_error() {
    let err = TriageError::Source("connection failed".to_string());
    assert_eq!(format!("{}", err), "source error: connection failed");
}

#[test]
fn test_converts_into_app_result() {
    fn fails() -> AppResult<()> {
        Err(TriageError::InvalidConfig("tier_weight".to_string()))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "invalid configuration: tier_weight");
    assert!(err.downcast_ref::<TriageError>().is_some());
}
