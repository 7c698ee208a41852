//! Triage engine: the single owner of the queue, the worker pool and the
//! entity index.
//!
//! Every public mutation runs to completion against `&mut self`, so wrapping
//! the engine in one lock (see [`crate::runtime::SharedEngine`]) or one actor
//! thread (see [`crate::runtime::EngineActor`]) is enough to make
//! "dequeue + assign" atomic. An entity is never visible as both Waiting and
//! Assigned.
//!
//! Lifecycle:
//!
//! ```text
//! submit ──► Waiting ──assign──► Assigned ──start──► InProgress
//!               │                   │                    │
//!               └─cancel/complete (releases worker)──────┴─► Completed | Cancelled
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::{
    build_audit_event, score, Analytics, AssignmentRequest, AuditAction, AuditSink, EntityId,
    EntityRecord, EntityStatus, QueueStats, ScoreTier, ScoringPolicy, Submission, TriageError,
    UrgentQueue, WorkerId, WorkerLoad, WorkerPool,
};
use crate::util::clock::{Clock, SystemClock};

/// Heap size below which stale entries are left for pops to discard.
const COMPACT_MIN_HEAP_LEN: usize = 64;

/// Outcome of [`TriageEngine::submit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Tier computed at submission.
    pub tier: ScoreTier,
    /// Score computed at submission.
    pub score: f64,
    /// Waiting or Assigned.
    pub status: EntityStatus,
    /// Worker chosen immediately, if any had room.
    pub assigned_worker: Option<WorkerId>,
    /// 1-based queue rank when the entity was left waiting.
    pub queue_position: Option<usize>,
}

/// Entity handed to a worker by [`TriageEngine::serve_next`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServedEntity {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Worker now holding the entity.
    pub worker_id: WorkerId,
    /// Tier of the entity.
    pub tier: ScoreTier,
    /// Score the entity was queued with.
    pub score: f64,
    /// Milliseconds between submission and assignment.
    pub waited_ms: u128,
}

/// Priority triage engine parametrized by a domain [`ScoringPolicy`].
pub struct TriageEngine<S: ScoringPolicy> {
    policy: S,
    config: EngineConfig,
    queue: UrgentQueue,
    pool: WorkerPool,
    entities: HashMap<EntityId, EntityRecord<S::Inputs>>,
    clock: Arc<dyn Clock>,
    audit: Option<Box<dyn AuditSink>>,
}

impl<S: ScoringPolicy> TriageEngine<S> {
    /// Build an engine, registering every worker listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidConfig` if the configuration fails validation.
    pub fn new(policy: S, config: EngineConfig) -> Result<Self, TriageError> {
        config.validate().map_err(TriageError::InvalidConfig)?;
        let mut pool = WorkerPool::new(config.assignment.clone());
        for worker in &config.workers {
            pool.register(worker.id.clone(), worker.capacity, worker.tags.iter().cloned())?;
        }
        info!(
            policy = policy.name(),
            workers = config.workers.len(),
            weights_version = config.scoring.version,
            "triage engine created"
        );
        Ok(Self {
            policy,
            config,
            queue: UrgentQueue::new(),
            pool,
            entities: HashMap::new(),
            clock: Arc::new(SystemClock),
            audit: None,
        })
    }

    /// Replace the clock used for timestamps and waiting-time penalties.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Register a worker or update an existing one's capacity and tags.
    ///
    /// # Errors
    ///
    /// See [`WorkerPool::register`].
    pub fn register_worker<T>(
        &mut self,
        worker_id: impl Into<WorkerId>,
        capacity: u32,
        tags: impl IntoIterator<Item = T>,
    ) -> Result<(), TriageError>
    where
        T: Into<String>,
    {
        self.pool.register(worker_id, capacity, tags)
    }

    /// Remove an idle worker. Returns false if unknown or still holding work.
    pub fn deregister_worker(&mut self, worker_id: &str) -> bool {
        self.pool.deregister(worker_id)
    }

    /// Score and queue a new entity, then try to hand it to a worker at once.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::DuplicateEntity` if the id was already submitted.
    /// No state changes in that case.
    pub fn submit(
        &mut self,
        submission: Submission<S::Inputs>,
    ) -> Result<SubmitReceipt, TriageError> {
        let Submission {
            id,
            inputs,
            submitted_at_ms,
        } = submission;
        if self.entities.contains_key(&id) {
            warn!(entity_id = %id, "duplicate submission rejected");
            return Err(TriageError::DuplicateEntity(id));
        }

        let now = self.clock.now_ms();
        let submitted_at_ms = submitted_at_ms.unwrap_or(now);
        let entity_score = score(
            &self.policy,
            &self.config.scoring,
            &inputs,
            now.saturating_sub(submitted_at_ms),
        );
        let required_tags = self.policy.required_tags(&inputs);
        let estimated_duration_ms = self.policy.estimated_duration_ms(&inputs);
        self.queue.insert(id.clone(), entity_score);

        let mut record = EntityRecord {
            id: id.clone(),
            inputs,
            score: entity_score,
            status: EntityStatus::Waiting,
            required_tags,
            submitted_at_ms,
            assigned_at_ms: None,
            finished_at_ms: None,
            assigned_worker: None,
            estimated_duration_ms,
        };
        info!(
            entity_id = %id,
            tier = %entity_score.tier,
            score = entity_score.value,
            "entity submitted"
        );

        let assigned = assign_worker(&self.policy, &mut self.pool, &record);
        if let Some(worker_id) = &assigned {
            self.queue.invalidate(&id);
            record.status = EntityStatus::Assigned;
            record.assigned_at_ms = Some(now);
            record.assigned_worker = Some(worker_id.clone());
            info!(entity_id = %id, worker_id = %worker_id, "entity assigned on submission");
        }

        let receipt = SubmitReceipt {
            entity_id: id.clone(),
            tier: entity_score.tier,
            score: entity_score.value,
            status: record.status,
            assigned_worker: assigned.clone(),
            queue_position: self.queue.position(&id),
        };
        self.entities.insert(id.clone(), record);

        self.record_audit(
            &id,
            None,
            AuditAction::Submitted,
            Some(format!("tier={} score={}", entity_score.tier, entity_score.value)),
        );
        if assigned.is_some() {
            self.record_audit(&id, assigned, AuditAction::Assigned, None);
            self.compact_if_sparse();
        }
        Ok(receipt)
    }

    /// Pop the best waiting entity and assign it.
    ///
    /// Head-of-line: if the best entity has no eligible worker with room, it is
    /// put back with its original score and sequence and `None` is returned.
    /// Exactly one pop is attempted per call.
    pub fn serve_next(&mut self) -> Option<ServedEntity> {
        self.compact_if_sparse();
        let entry = self.queue.pop_entry()?;
        let Some(record) = self.entities.get(&entry.entity_id) else {
            warn!(entity_id = %entry.entity_id, "queued id missing from entity index");
            return None;
        };

        let Some(worker_id) = assign_worker(&self.policy, &mut self.pool, record) else {
            debug!(
                entity_id = %entry.entity_id,
                tier = %entry.score.tier,
                "no worker available, entity requeued"
            );
            let entity_id = entry.entity_id.clone();
            self.queue.reinstate(entry);
            self.record_audit(&entity_id, None, AuditAction::Requeued, None);
            return None;
        };

        let now = self.clock.now_ms();
        let record = self.entities.get_mut(&entry.entity_id)?;
        record.status = EntityStatus::Assigned;
        record.assigned_at_ms = Some(now);
        record.assigned_worker = Some(worker_id.clone());
        let served = ServedEntity {
            entity_id: entry.entity_id,
            worker_id,
            tier: entry.score.tier,
            score: entry.score.value,
            waited_ms: now.saturating_sub(record.submitted_at_ms),
        };
        info!(
            entity_id = %served.entity_id,
            worker_id = %served.worker_id,
            tier = %served.tier,
            waited_ms = %served.waited_ms,
            "entity served"
        );
        self.record_audit(
            &served.entity_id,
            Some(served.worker_id.clone()),
            AuditAction::Assigned,
            None,
        );
        Some(served)
    }

    /// Replace the scoring inputs of a Waiting entity and re-queue it with a
    /// fresh score and sequence. Returns false for unknown or non-Waiting ids.
    pub fn update_inputs(&mut self, entity_id: &str, inputs: S::Inputs) -> bool {
        let now = self.clock.now_ms();
        let Some(record) = self.entities.get_mut(entity_id) else {
            return false;
        };
        if record.status != EntityStatus::Waiting {
            warn!(entity_id, status = %record.status, "update rejected: entity is not waiting");
            return false;
        }

        let new_score = score(
            &self.policy,
            &self.config.scoring,
            &inputs,
            now.saturating_sub(record.submitted_at_ms),
        );
        let previous = record.score;
        record.required_tags = self.policy.required_tags(&inputs);
        record.estimated_duration_ms = self.policy.estimated_duration_ms(&inputs);
        record.inputs = inputs;
        record.score = new_score;
        if !self.queue.rescore(entity_id, new_score) {
            self.queue.insert(entity_id, new_score);
        }
        debug!(
            entity_id,
            from = previous.value,
            to = new_score.value,
            tier = %new_score.tier,
            "entity rescored"
        );
        self.record_audit(
            entity_id,
            None,
            AuditAction::Rescored,
            Some(format!("{} -> {}", previous.value, new_score.value)),
        );
        true
    }

    /// Mark an Assigned entity as started. Returns false otherwise.
    pub fn start(&mut self, entity_id: &str) -> bool {
        let Some(record) = self.entities.get_mut(entity_id) else {
            return false;
        };
        if record.status != EntityStatus::Assigned {
            warn!(entity_id, status = %record.status, "start rejected: entity is not assigned");
            return false;
        }
        record.status = EntityStatus::InProgress;
        let worker = record.assigned_worker.clone();
        self.record_audit(entity_id, worker, AuditAction::Started, None);
        true
    }

    /// Complete an entity, releasing its worker. Returns false for unknown or
    /// already-finished ids; a second call has no effect.
    pub fn complete(&mut self, entity_id: &str) -> bool {
        self.finish(entity_id, EntityStatus::Completed)
    }

    /// Cancel an entity, releasing its worker or dropping its queue entry.
    /// Returns false for unknown or already-finished ids.
    pub fn cancel(&mut self, entity_id: &str) -> bool {
        self.finish(entity_id, EntityStatus::Cancelled)
    }

    fn finish(&mut self, entity_id: &str, outcome: EntityStatus) -> bool {
        let now = self.clock.now_ms();
        let Some(record) = self.entities.get_mut(entity_id) else {
            return false;
        };
        if record.status.is_terminal() {
            warn!(entity_id, status = %record.status, "finish rejected: entity already finished");
            return false;
        }

        let previous = record.status;
        record.status = outcome;
        record.finished_at_ms = Some(now);
        let worker = if previous.holds_worker() {
            record.assigned_worker.clone()
        } else {
            None
        };

        if previous == EntityStatus::Waiting {
            self.queue.invalidate(entity_id);
        }
        if let Some(worker_id) = &worker {
            self.pool.release(worker_id, entity_id);
        }
        info!(entity_id, from = %previous, to = %outcome, "entity finished");

        let action = if outcome == EntityStatus::Completed {
            AuditAction::Completed
        } else {
            AuditAction::Cancelled
        };
        self.record_audit(entity_id, worker, action, None);
        true
    }

    /// Best Waiting entity without removing it.
    pub fn peek_next(&mut self) -> Option<&str> {
        self.queue.peek().map(String::as_str)
    }

    /// Look up an entity by id.
    pub fn entity(&self, entity_id: &str) -> Option<&EntityRecord<S::Inputs>> {
        self.entities.get(entity_id)
    }

    /// All entities in unspecified order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord<S::Inputs>> {
        self.entities.values()
    }

    /// 1-based rank of a Waiting entity.
    pub fn queue_position(&self, entity_id: &str) -> Option<usize> {
        self.queue.position(entity_id)
    }

    /// Live queue counts by tier.
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Per-worker load snapshot.
    pub fn workload(&self) -> BTreeMap<WorkerId, WorkerLoad> {
        self.pool.workload()
    }

    /// Read-only analytics over the current state.
    pub fn analytics(&self) -> Analytics<'_, S::Inputs> {
        Analytics::new(
            &self.entities,
            &self.pool,
            &self.config.bottlenecks,
            self.clock.now_ms(),
        )
    }

    /// Physically drop stale queue entries. Returns how many were removed.
    pub fn compact_queue(&mut self) -> usize {
        let removed = self.queue.compact();
        debug!(removed, "queue compacted");
        removed
    }

    /// Stale entries under a long-lived head are never popped, so rebuild the
    /// heap once they outnumber the live entries.
    fn compact_if_sparse(&mut self) {
        let heap_len = self.queue.heap_len();
        if heap_len > COMPACT_MIN_HEAP_LEN && heap_len > 2 * self.queue.len() {
            self.compact_queue();
        }
    }

    /// Current time according to the engine's clock.
    pub fn now_ms(&self) -> u128 {
        self.clock.now_ms()
    }

    /// Worker pool (read-only).
    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Urgent queue (read-only).
    pub const fn queue(&self) -> &UrgentQueue {
        &self.queue
    }

    /// Domain policy.
    pub const fn policy(&self) -> &S {
        &self.policy
    }

    /// Configuration the engine was built with.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn record_audit(
        &mut self,
        entity_id: &str,
        worker_id: Option<WorkerId>,
        action: AuditAction,
        detail: Option<String>,
    ) {
        if let Some(sink) = self.audit.as_mut() {
            let now = self.clock.now_ms();
            sink.record(build_audit_event(entity_id, worker_id, action, Some(now), detail));
        }
    }
}

/// Pick a worker for `record`, letting the policy adjust each candidate.
fn assign_worker<S: ScoringPolicy>(
    policy: &S,
    pool: &mut WorkerPool,
    record: &EntityRecord<S::Inputs>,
) -> Option<WorkerId> {
    let weights = pool.weights().clone();
    let request =
        AssignmentRequest::new(&record.id, record.tier()).with_required_tags(&record.required_tags);
    pool.assign_with(&request, |worker| {
        policy.assignment_adjustment(&record.inputs, worker, &weights)
    })
}
