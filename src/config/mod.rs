//! Configuration models for scoring, assignment, and bottleneck detection.

pub mod engine;

pub use engine::{
    AssignmentWeights, BottleneckThresholds, EngineConfig, ScoringWeights, WorkerConfig,
    CONFIG_PATH_ENV,
};
