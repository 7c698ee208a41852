//! Read-only analytics over the engine's authoritative entity index.
//!
//! Nothing here looks at heap storage: stale queue entries never leak into
//! depths, waits or alerts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::BottleneckThresholds;
use crate::core::{EntityId, EntityRecord, EntityStatus, ScoreTier, WorkerPool};

/// Bottleneck severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Needs attention soon.
    Medium,
    /// Needs attention now.
    High,
}

/// Kind of detected bottleneck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    /// Too many top-tier entities waiting.
    TopTierBacklog,
    /// Too many entities waiting overall.
    QueueBacklog,
    /// One or more workers above the utilization threshold.
    WorkerOverload,
    /// Entities are waiting and no worker has room.
    PoolSaturated,
}

impl fmt::Display for BottleneckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TopTierBacklog => "top_tier_backlog",
            Self::QueueBacklog => "queue_backlog",
            Self::WorkerOverload => "worker_overload",
            Self::PoolSaturated => "pool_saturated",
        };
        f.write_str(label)
    }
}

/// A detected bottleneck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottleneck {
    /// What was detected.
    pub kind: BottleneckKind,
    /// How bad it is.
    pub severity: Severity,
    /// Human-readable description with counts.
    pub description: String,
    /// Suggested remedy.
    pub recommendation: String,
}

/// Wait statistics for one tier, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaitSummary {
    /// Number of samples.
    pub count: usize,
    /// Mean wait.
    pub average_ms: f64,
    /// Shortest wait.
    pub min_ms: u128,
    /// Longest wait.
    pub max_ms: u128,
}

/// A Waiting entity with how long it has waited so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingEntity {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Tier.
    pub tier: ScoreTier,
    /// Queued score.
    pub score: f64,
    /// Milliseconds since submission.
    pub waited_ms: u128,
}

/// Point-in-time view used to answer analytics queries.
pub struct Analytics<'a, I> {
    entities: &'a HashMap<EntityId, EntityRecord<I>>,
    pool: &'a WorkerPool,
    thresholds: &'a BottleneckThresholds,
    now_ms: u128,
}

impl<'a, I> Analytics<'a, I> {
    /// Build a view over the given state.
    pub const fn new(
        entities: &'a HashMap<EntityId, EntityRecord<I>>,
        pool: &'a WorkerPool,
        thresholds: &'a BottleneckThresholds,
        now_ms: u128,
    ) -> Self {
        Self {
            entities,
            pool,
            thresholds,
            now_ms,
        }
    }

    fn waiting(&self) -> impl Iterator<Item = &'a EntityRecord<I>> {
        self.entities
            .values()
            .filter(|e| e.status == EntityStatus::Waiting)
    }

    /// Waiting entities per tier; every tier is present.
    pub fn queue_depth_by_tier(&self) -> BTreeMap<ScoreTier, usize> {
        let mut depth: BTreeMap<ScoreTier, usize> =
            ScoreTier::ALL.iter().map(|tier| (*tier, 0)).collect();
        for entity in self.waiting() {
            *depth.entry(entity.tier()).or_default() += 1;
        }
        depth
    }

    /// Entities per status; every status is present.
    pub fn status_distribution(&self) -> BTreeMap<EntityStatus, usize> {
        let mut counts: BTreeMap<EntityStatus, usize> = [
            EntityStatus::Waiting,
            EntityStatus::Assigned,
            EntityStatus::InProgress,
            EntityStatus::Completed,
            EntityStatus::Cancelled,
        ]
        .into_iter()
        .map(|status| (status, 0))
        .collect();
        for entity in self.entities.values() {
            *counts.entry(entity.status).or_default() += 1;
        }
        counts
    }

    /// Mean `finished - submitted` over Completed entities of `tier`, in ms.
    pub fn average_wait(&self, tier: ScoreTier) -> Option<f64> {
        let waits: Vec<u128> = self
            .completed_waits()
            .filter(|(t, _)| *t == tier)
            .map(|(_, wait)| wait)
            .collect();
        mean(&waits)
    }

    /// Mean `assigned - submitted` over every entity of `tier` that reached a
    /// worker, in ms.
    pub fn average_queue_wait(&self, tier: ScoreTier) -> Option<f64> {
        let waits: Vec<u128> = self
            .entities
            .values()
            .filter(|e| e.tier() == tier)
            .filter_map(|e| e.assigned_at_ms.map(|at| at.saturating_sub(e.submitted_at_ms)))
            .collect();
        mean(&waits)
    }

    /// Completed-entity wait statistics per tier; tiers without samples are absent.
    pub fn wait_summary(&self) -> BTreeMap<ScoreTier, WaitSummary> {
        let mut samples: BTreeMap<ScoreTier, Vec<u128>> = BTreeMap::new();
        for (tier, wait) in self.completed_waits() {
            samples.entry(tier).or_default().push(wait);
        }
        samples
            .into_iter()
            .filter_map(|(tier, waits)| {
                let average_ms = mean(&waits)?;
                Some((
                    tier,
                    WaitSummary {
                        count: waits.len(),
                        average_ms,
                        min_ms: waits.iter().copied().min()?,
                        max_ms: waits.iter().copied().max()?,
                    },
                ))
            })
            .collect()
    }

    /// Up to `limit` Waiting entities, longest wait first.
    pub fn longest_waiting(&self, limit: usize) -> Vec<WaitingEntity> {
        let mut waiting: Vec<WaitingEntity> = self.waiting().map(|e| self.describe(e)).collect();
        waiting.sort_by(|a, b| {
            b.waited_ms
                .cmp(&a.waited_ms)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        waiting.truncate(limit);
        waiting
    }

    /// Summed service-time estimate of every Waiting entity, in ms. Entities
    /// without an estimate count as zero.
    pub fn estimated_backlog_ms(&self) -> u128 {
        self.waiting().filter_map(|e| e.estimated_duration_ms).sum()
    }

    /// Top-tier entities still Waiting, in service order.
    pub fn critical_alerts(&self) -> Vec<WaitingEntity> {
        let mut alerts: Vec<WaitingEntity> = self
            .waiting()
            .filter(|e| e.tier() == ScoreTier::top())
            .map(|e| self.describe(e))
            .collect();
        alerts.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| b.waited_ms.cmp(&a.waited_ms))
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        alerts
    }

    /// Apply the configured thresholds to the current state.
    pub fn bottlenecks(&self) -> Vec<Bottleneck> {
        let mut found = Vec::new();
        let depth = self.queue_depth_by_tier();
        let top = ScoreTier::top();

        let top_waiting = depth.get(&top).copied().unwrap_or(0);
        if top_waiting > self.thresholds.top_tier_backlog {
            found.push(Bottleneck {
                kind: BottleneckKind::TopTierBacklog,
                severity: Severity::High,
                description: format!("{top_waiting} {top} entities waiting"),
                recommendation: "Immediate attention required; bring in additional workers".into(),
            });
        }

        let total_waiting: usize = depth.values().sum();
        if total_waiting > self.thresholds.queue_backlog {
            found.push(Bottleneck {
                kind: BottleneckKind::QueueBacklog,
                severity: Severity::High,
                description: format!("{total_waiting} entities waiting in queue"),
                recommendation: "Add capacity or defer routine work".into(),
            });
        }

        let overloaded = self
            .pool
            .workers()
            .filter(|w| w.utilization() > self.thresholds.worker_utilization_pct)
            .count();
        if overloaded > 0 {
            found.push(Bottleneck {
                kind: BottleneckKind::WorkerOverload,
                severity: Severity::Medium,
                description: format!(
                    "{overloaded} workers above {}% utilization",
                    self.thresholds.worker_utilization_pct
                ),
                recommendation: "Redistribute work or call backup workers".into(),
            });
        }

        if total_waiting > 0 && !self.pool.has_spare_capacity() {
            found.push(Bottleneck {
                kind: BottleneckKind::PoolSaturated,
                severity: Severity::High,
                description: format!("{total_waiting} entities waiting with no free worker"),
                recommendation: "Complete in-flight work or register more workers".into(),
            });
        }
        found
    }

    fn completed_waits(&self) -> impl Iterator<Item = (ScoreTier, u128)> + 'a {
        self.entities.values().filter_map(|e| {
            if e.status != EntityStatus::Completed {
                return None;
            }
            e.finished_at_ms
                .map(|finished| (e.tier(), finished.saturating_sub(e.submitted_at_ms)))
        })
    }

    fn describe(&self, entity: &EntityRecord<I>) -> WaitingEntity {
        WaitingEntity {
            entity_id: entity.id.clone(),
            tier: entity.tier(),
            score: entity.score.value,
            waited_ms: entity.waited_ms(self.now_ms),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(samples: &[u128]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: u128 = samples.iter().sum();
    Some(total as f64 / samples.len() as f64)
}
