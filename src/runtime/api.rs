//! Presentation-facing response models.
//!
//! Plain data only: ids, scores, tiers and counts. Rendering is the caller's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    Bottleneck, EntityStatus, PoolStats, QueueStats, ScoreTier, ScoringPolicy, TriageEngine,
    WaitSummary, WaitingEntity, WorkerId, WorkerLoad,
};

/// How many entries the dashboard lists as longest waiting.
pub const LONGEST_WAITING_LIMIT: usize = 5;

/// Everything a dashboard renders, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Capture time (ms since epoch).
    pub generated_at_ms: u128,
    /// Policy name.
    pub policy: String,
    /// Live queue counts.
    pub queue: QueueStats,
    /// Waiting entities per tier.
    pub depth_by_tier: BTreeMap<ScoreTier, usize>,
    /// Entities per status.
    pub status_distribution: BTreeMap<EntityStatus, usize>,
    /// Per-worker load.
    pub workload: BTreeMap<WorkerId, WorkerLoad>,
    /// Pool totals.
    pub pool: PoolStats,
    /// Completed waits per tier.
    pub wait_summary: BTreeMap<ScoreTier, WaitSummary>,
    /// Top-tier entities still waiting.
    pub critical_alerts: Vec<WaitingEntity>,
    /// Longest-waiting entities.
    pub longest_waiting: Vec<WaitingEntity>,
    /// Detected bottlenecks.
    pub bottlenecks: Vec<Bottleneck>,
    /// All entities seen.
    pub total_entities: usize,
    /// Waiting, Assigned or InProgress.
    pub active_entities: usize,
    /// Estimated service time of the waiting backlog, in ms.
    pub estimated_backlog_ms: u128,
}

impl DashboardSnapshot {
    /// Capture a snapshot of `engine`.
    pub fn capture<S: ScoringPolicy>(engine: &TriageEngine<S>) -> Self {
        let analytics = engine.analytics();
        let status_distribution = analytics.status_distribution();
        let total_entities = status_distribution.values().sum();
        let active_entities = status_distribution
            .iter()
            .filter(|(status, _)| !status.is_terminal())
            .map(|(_, count)| count)
            .sum();
        Self {
            generated_at_ms: engine.now_ms(),
            policy: engine.policy().name().to_string(),
            queue: engine.queue_stats(),
            depth_by_tier: analytics.queue_depth_by_tier(),
            status_distribution,
            workload: engine.workload(),
            pool: engine.pool().stats(),
            wait_summary: analytics.wait_summary(),
            critical_alerts: analytics.critical_alerts(),
            longest_waiting: analytics.longest_waiting(LONGEST_WAITING_LIMIT),
            bottlenecks: analytics.bottlenecks(),
            total_entities,
            active_entities,
            estimated_backlog_ms: analytics.estimated_backlog_ms(),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Entities waiting.
    pub waiting: usize,
    /// Registered workers.
    pub workers: usize,
}

/// Return a health payload for `engine`. Unhealthy when work waits and no
/// worker is registered to take it.
pub fn health<S: ScoringPolicy>(engine: &TriageEngine<S>) -> Health {
    let waiting = engine.queue_stats().count;
    let workers = engine.pool().stats().worker_count;
    Health {
        ok: waiting == 0 || workers > 0,
        waiting,
        workers,
    }
}
