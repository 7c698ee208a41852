//! Capacity-bounded workers and greedy least-load assignment.
//!
//! Assignment is a real-time dispatcher, not an optimizer: each call scans the
//! eligible workers once (O(workers)) and picks the lowest assignment score
//!
//! ```text
//! assignment_score = current_load * load_weight - tier_bonus(tier) - adjustment
//! ```
//!
//! breaking ties by worker id. Already-assigned entities are never moved.
//!
//! Load counters change only through [`WorkerPool::assign_with`] and
//! [`WorkerPool::release`], and every assignment is recorded against its entity,
//! so releases arriving in any order (or twice) cannot corrupt a counter.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AssignmentWeights;
use crate::core::{EntityId, ScoreTier, TriageError, WorkerId};

/// A worker and its current load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
    /// Worker identifier.
    pub id: WorkerId,
    /// Maximum concurrent entities.
    pub capacity: u32,
    /// Entities currently assigned (`0 <= current_load <= capacity`).
    pub current_load: u32,
    /// Specialization tags used for eligibility and matching.
    pub tags: BTreeSet<String>,
    /// Assignments retired so far.
    pub released_total: u64,
}

impl WorkerRecord {
    /// Whether another entity fits.
    pub const fn has_capacity(&self) -> bool {
        self.current_load < self.capacity
    }

    /// Load as a percentage of capacity.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.current_load) / f64::from(self.capacity) * 100.0
    }

    /// Whether the worker carries every tag in `required`.
    pub fn matches(&self, required: &[String]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }

    /// Whether the worker carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// What the pool needs to know about an entity to place it.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentRequest<'a> {
    /// Entity being placed.
    pub entity_id: &'a str,
    /// Entity tier, feeding the tier bonus.
    pub tier: ScoreTier,
    /// Tags a worker must carry.
    pub required_tags: &'a [String],
    /// Optional allow-list of workers.
    pub eligible_workers: Option<&'a [WorkerId]>,
}

impl<'a> AssignmentRequest<'a> {
    /// Request with no tag or worker restrictions.
    pub const fn new(entity_id: &'a str, tier: ScoreTier) -> Self {
        Self {
            entity_id,
            tier,
            required_tags: &[],
            eligible_workers: None,
        }
    }

    /// Require tags.
    #[must_use]
    pub const fn with_required_tags(mut self, tags: &'a [String]) -> Self {
        self.required_tags = tags;
        self
    }

    /// Restrict to an allow-list of workers.
    #[must_use]
    pub const fn with_eligible_workers(mut self, workers: &'a [WorkerId]) -> Self {
        self.eligible_workers = Some(workers);
        self
    }
}

/// Per-worker load snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerLoad {
    /// Entities currently assigned.
    pub current_load: u32,
    /// Maximum concurrent entities.
    pub capacity: u32,
    /// Load as a percentage of capacity.
    pub utilization: f64,
    /// Assignments retired so far.
    pub released_total: u64,
}

/// Aggregate pool statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Registered workers.
    pub worker_count: usize,
    /// Active assignments.
    pub active_assignments: usize,
    /// Sum of current loads.
    pub used_capacity: u64,
    /// Sum of capacities.
    pub total_capacity: u64,
    /// Workers with spare capacity.
    pub available_workers: usize,
}

/// Registry of workers plus the entity-to-worker assignment table.
#[derive(Debug, Default)]
pub struct WorkerPool {
    weights: AssignmentWeights,
    workers: BTreeMap<WorkerId, WorkerRecord>,
    assignments: HashMap<EntityId, WorkerId>,
}

impl WorkerPool {
    /// Create an empty pool ranking workers with `weights`.
    pub fn new(weights: AssignmentWeights) -> Self {
        Self {
            weights,
            workers: BTreeMap::new(),
            assignments: HashMap::new(),
        }
    }

    /// Assignment weights in use.
    pub const fn weights(&self) -> &AssignmentWeights {
        &self.weights
    }

    /// Register a worker, or update capacity and tags of an existing one while
    /// keeping its load.
    ///
    /// # Errors
    ///
    /// - `TriageError::InvalidConfig` if `capacity` is 0 or the id is empty
    /// - `TriageError::CapacityBelowLoad` if an update would shrink capacity below load
    pub fn register<T>(
        &mut self,
        worker_id: impl Into<WorkerId>,
        capacity: u32,
        tags: impl IntoIterator<Item = T>,
    ) -> Result<(), TriageError>
    where
        T: Into<String>,
    {
        let worker_id = worker_id.into();
        if worker_id.is_empty() {
            return Err(TriageError::InvalidConfig("worker id must not be empty".into()));
        }
        if capacity == 0 {
            return Err(TriageError::InvalidConfig(format!(
                "worker `{worker_id}` capacity must be greater than 0"
            )));
        }
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();

        if let Some(existing) = self.workers.get_mut(&worker_id) {
            if capacity < existing.current_load {
                return Err(TriageError::CapacityBelowLoad {
                    worker: worker_id,
                    capacity,
                    load: existing.current_load,
                });
            }
            existing.capacity = capacity;
            existing.tags = tags;
            info!(worker_id = %worker_id, capacity, "worker updated");
            return Ok(());
        }

        info!(worker_id = %worker_id, capacity, tags = ?tags, "worker registered");
        self.workers.insert(
            worker_id.clone(),
            WorkerRecord {
                id: worker_id,
                capacity,
                current_load: 0,
                tags,
                released_total: 0,
            },
        );
        Ok(())
    }

    /// Remove an idle worker. Returns false if unknown or still loaded.
    pub fn deregister(&mut self, worker_id: &str) -> bool {
        let idle = self
            .workers
            .get(worker_id)
            .is_some_and(|worker| worker.current_load == 0);
        if !idle {
            return false;
        }
        self.workers.remove(worker_id);
        info!(worker_id, "worker deregistered");
        true
    }

    /// Assign using pure least-load ranking.
    pub fn assign(&mut self, request: &AssignmentRequest<'_>) -> Option<WorkerId> {
        self.assign_with(request, |_| 0.0)
    }

    /// Assign to the best eligible worker with spare capacity, using `adjust` for
    /// domain-specific preferences. Returns `None` when no eligible worker has room
    /// or the entity already holds an assignment.
    pub fn assign_with<F>(&mut self, request: &AssignmentRequest<'_>, adjust: F) -> Option<WorkerId>
    where
        F: Fn(&WorkerRecord) -> f64,
    {
        if self.assignments.contains_key(request.entity_id) {
            debug!(entity_id = request.entity_id, "entity already assigned");
            return None;
        }

        let tier_bonus = self.weights.tier_bonus(request.tier);
        let mut best: Option<(f64, &WorkerId)> = None;
        for (id, worker) in &self.workers {
            if !worker.has_capacity() || !worker.matches(request.required_tags) {
                continue;
            }
            if let Some(allowed) = request.eligible_workers {
                if !allowed.iter().any(|w| w == id) {
                    continue;
                }
            }
            let adjustment = adjust(worker);
            let adjustment = if adjustment.is_finite() { adjustment } else { 0.0 };
            let score =
                f64::from(worker.current_load) * self.weights.load_weight - tier_bonus - adjustment;
            // BTreeMap iterates ids ascending, so strict `<` keeps the lowest id on ties.
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, id));
            }
        }

        let chosen = best.map(|(_, id)| id.clone())?;
        if let Some(worker) = self.workers.get_mut(&chosen) {
            worker.current_load += 1;
        }
        self.assignments
            .insert(request.entity_id.to_owned(), chosen.clone());
        debug!(entity_id = request.entity_id, worker_id = %chosen, "worker assigned");
        Some(chosen)
    }

    /// Retire the assignment of `entity_id` to `worker_id`. No-op returning false
    /// if that assignment does not exist.
    pub fn release(&mut self, worker_id: &str, entity_id: &str) -> bool {
        if self.assignments.get(entity_id).map(String::as_str) != Some(worker_id) {
            return false;
        }
        self.assignments.remove(entity_id);
        if let Some(worker) = self.workers.get_mut(worker_id) {
            worker.current_load = worker.current_load.saturating_sub(1);
            worker.released_total += 1;
        }
        debug!(entity_id, worker_id, "worker released");
        true
    }

    /// Worker currently holding `entity_id`.
    pub fn worker_for(&self, entity_id: &str) -> Option<&WorkerId> {
        self.assignments.get(entity_id)
    }

    /// Look up a worker.
    pub fn worker(&self, worker_id: &str) -> Option<&WorkerRecord> {
        self.workers.get(worker_id)
    }

    /// All workers in id order.
    pub fn workers(&self) -> impl Iterator<Item = &WorkerRecord> {
        self.workers.values()
    }

    /// Whether any worker has spare capacity.
    pub fn has_spare_capacity(&self) -> bool {
        self.workers.values().any(WorkerRecord::has_capacity)
    }

    /// Per-worker load snapshot.
    pub fn workload(&self) -> BTreeMap<WorkerId, WorkerLoad> {
        self.workers
            .iter()
            .map(|(id, worker)| {
                (
                    id.clone(),
                    WorkerLoad {
                        current_load: worker.current_load,
                        capacity: worker.capacity,
                        utilization: worker.utilization(),
                        released_total: worker.released_total,
                    },
                )
            })
            .collect()
    }

    /// Aggregate statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            worker_count: self.workers.len(),
            active_assignments: self.assignments.len(),
            used_capacity: self.workers.values().map(|w| u64::from(w.current_load)).sum(),
            total_capacity: self.workers.values().map(|w| u64::from(w.capacity)).sum(),
            available_workers: self.workers.values().filter(|w| w.has_capacity()).count(),
        }
    }
}
