//! Core triage abstractions: scoring, queueing, assignment and analytics.

pub mod analytics;
pub mod audit;
pub mod engine;
pub mod entity;
pub mod error;
pub mod scoring;
pub mod urgent_queue;
pub mod worker_pool;

pub use analytics::{
    Analytics, Bottleneck, BottleneckKind, Severity, WaitSummary, WaitingEntity,
};
pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use engine::{ServedEntity, SubmitReceipt, TriageEngine};
pub use entity::{
    EntityId, EntityRecord, EntityStatus, Score, ScoreTier, Submission, WorkerId,
};
pub use error::{AppResult, TriageError};
pub use scoring::{ScoringPolicy, compose_score, score};
pub use urgent_queue::{QueueEntry, QueueStats, UrgentQueue};
pub use worker_pool::{AssignmentRequest, PoolStats, WorkerLoad, WorkerPool, WorkerRecord};
