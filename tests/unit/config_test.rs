//! Tests for configuration validation

use prometheus_triage::config::{
    AssignmentWeights, BottleneckThresholds, EngineConfig, ScoringWeights, WorkerConfig,
};

fn worker(id: &str, capacity: u32) -> WorkerConfig {
    WorkerConfig {
        id: id.to_string(),
        capacity,
        tags: vec![],
    }
}

#[test]
fn test_engine_config_validation() {
    let valid = EngineConfig {
        workers: vec![worker("w1", 2), worker("w2", 1)],
        ..EngineConfig::default()
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_engine_config_invalid_worker_capacity() {
    let invalid = EngineConfig {
        workers: vec![worker("w1", 0)],
        ..EngineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_engine_config_invalid_worker_id() {
    let invalid = EngineConfig {
        workers: vec![worker("", 1)],
        ..EngineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scoring_weights_must_keep_tiers_dominant() {
    let invalid = EngineConfig {
        scoring: ScoringWeights {
            max_wait_penalty: 1_000.0,
            ..ScoringWeights::default()
        },
        ..EngineConfig::default()
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.starts_with("scoring invalid"));
}

#[test]
fn test_assignment_weights_reject_nan() {
    let invalid = EngineConfig {
        assignment: AssignmentWeights {
            load_weight: f64::NAN,
            ..AssignmentWeights::default()
        },
        ..EngineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_bottleneck_utilization_bounds() {
    let invalid = EngineConfig {
        bottlenecks: BottleneckThresholds {
            worker_utilization_pct: 120.0,
            ..BottleneckThresholds::default()
        },
        ..EngineConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_from_json_str_rejects_garbage() {
    let err = EngineConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_from_path_round_trip() {
    let config = EngineConfig {
        workers: vec![worker("lab-1", 3)],
        ..EngineConfig::default()
    };
    let path = std::env::temp_dir().join(format!("triage-config-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = EngineConfig::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_from_path_missing_file_has_context() {
    let err = EngineConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(format!("{err:#}").contains("reading triage config"));
}
