//! # Prometheus Triage
//!
//! A single-process, in-memory triage and dispatch engine: score incoming work,
//! queue it by urgency, and route it to one of several capacity-bounded workers.
//!
//! The same engine backs every "triage something and hand it to a bounded worker"
//! domain on the platform (patients, lab orders, restock lines, support tickets).
//! Domains differ only in their [`core::ScoringPolicy`]; the queueing and
//! assignment machinery is shared.
//!
//! ## Core Problem Solved
//!
//! Priority work has keys that change while it waits:
//!
//! - **Dynamic scores**: an entity's urgency is recomputed when its inputs change,
//!   which a plain binary heap with static keys cannot express
//! - **Lazy deletion**: cancelled or re-scored entries stay in heap storage until
//!   they surface, so every read must go through the authoritative index
//! - **Bounded workers**: assignment must keep per-worker load counters exact while
//!   work completes in arbitrary order
//! - **Honest analytics**: queue depth, waits and bottlenecks must reflect the
//!   current state, never stale heap contents
//!
//! ## Key Features
//!
//! - **Tier-dominated scoring**: tiers always win over factor noise; ties are FIFO
//! - **Generation-stamped lazy deletion**: O(1) invalidate, O(log n) rescore
//! - **Greedy least-load dispatch**: O(workers) per assignment with tag eligibility
//! - **Coarse locking or actor**: [`runtime::SharedEngine`] or [`runtime::EngineActor`]
//! - **Pull ingestion**: [`runtime::IngestPoller`] feeds records from a document store
//!
//! ## Example
//!
//! ```rust
//! use prometheus_triage::config::EngineConfig;
//! use prometheus_triage::core::{EntityStatus, ScoreTier, Submission, TriageEngine};
//! use prometheus_triage::policies::{ExplicitInputs, ExplicitPolicy};
//!
//! let mut engine = TriageEngine::new(ExplicitPolicy, EngineConfig::default()).unwrap();
//! engine.register_worker("w1", 1, Vec::<String>::new()).unwrap();
//!
//! let first = engine
//!     .submit(Submission::new("e1", ExplicitInputs::new(ScoreTier::Emergency)))
//!     .unwrap();
//! assert_eq!(first.assigned_worker.as_deref(), Some("w1"));
//!
//! let second = engine
//!     .submit(Submission::new("e2", ExplicitInputs::new(ScoreTier::Critical)))
//!     .unwrap();
//! assert_eq!(second.status, EntityStatus::Waiting);
//!
//! assert!(engine.complete("e1"));
//! let served = engine.serve_next().unwrap();
//! assert_eq!(served.entity_id, "e2");
//! ```
//!
//! For complete scenarios, see `tests/engine_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core triage abstractions: scoring, queueing, assignment, analytics.
pub mod core;
/// Configuration models for scoring, assignment and bottleneck thresholds.
pub mod config;
/// Builders to construct engines from configuration.
pub mod builders;
/// Infrastructure adapters for external collaborators.
pub mod infra;
/// Domain scoring policies.
pub mod policies;
/// Runtime surfaces: shared engine, actor, ingest poller and API models.
pub mod runtime;
/// Shared utilities.
pub mod util;
