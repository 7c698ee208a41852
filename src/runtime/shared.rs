//! Engine shared across threads behind one coarse lock.
//!
//! Mutations take the write lock for the whole operation, so "dequeue +
//! assign" is atomic. Read-only queries share the read lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{
    EntityRecord, QueueStats, ScoringPolicy, ServedEntity, SubmitReceipt, Submission,
    TriageEngine, TriageError, WorkerId, WorkerLoad,
};
use crate::runtime::api::{health, DashboardSnapshot, Health};

/// Cloneable handle to a lock-guarded [`TriageEngine`].
pub struct SharedEngine<S: ScoringPolicy> {
    inner: Arc<RwLock<TriageEngine<S>>>,
}

impl<S: ScoringPolicy> Clone for SharedEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ScoringPolicy> SharedEngine<S> {
    /// Wrap an engine.
    pub fn new(engine: TriageEngine<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Submit under the write lock.
    ///
    /// # Errors
    ///
    /// See [`TriageEngine::submit`].
    pub fn submit(&self, submission: Submission<S::Inputs>) -> Result<SubmitReceipt, TriageError> {
        self.inner.write().submit(submission)
    }

    /// Serve the next entity under the write lock.
    pub fn serve_next(&self) -> Option<ServedEntity> {
        self.inner.write().serve_next()
    }

    /// Update inputs under the write lock.
    pub fn update_inputs(&self, entity_id: &str, inputs: S::Inputs) -> bool {
        self.inner.write().update_inputs(entity_id, inputs)
    }

    /// Start under the write lock.
    pub fn start(&self, entity_id: &str) -> bool {
        self.inner.write().start(entity_id)
    }

    /// Complete under the write lock.
    pub fn complete(&self, entity_id: &str) -> bool {
        self.inner.write().complete(entity_id)
    }

    /// Cancel under the write lock.
    pub fn cancel(&self, entity_id: &str) -> bool {
        self.inner.write().cancel(entity_id)
    }

    /// Register a worker under the write lock.
    ///
    /// # Errors
    ///
    /// See [`TriageEngine::register_worker`].
    pub fn register_worker(
        &self,
        worker_id: impl Into<WorkerId>,
        capacity: u32,
        tags: Vec<String>,
    ) -> Result<(), TriageError> {
        self.inner.write().register_worker(worker_id, capacity, tags)
    }

    /// Deregister an idle worker under the write lock.
    pub fn deregister_worker(&self, worker_id: &str) -> bool {
        self.inner.write().deregister_worker(worker_id)
    }

    /// Best waiting id. Takes the write lock because peeking discards stale entries.
    pub fn peek_next(&self) -> Option<String> {
        self.inner.write().peek_next().map(str::to_owned)
    }

    /// Clone of an entity record.
    pub fn entity(&self, entity_id: &str) -> Option<EntityRecord<S::Inputs>> {
        self.inner.read().entity(entity_id).cloned()
    }

    /// Queue rank of a waiting entity.
    pub fn queue_position(&self, entity_id: &str) -> Option<usize> {
        self.inner.read().queue_position(entity_id)
    }

    /// Live queue counts.
    pub fn queue_stats(&self) -> QueueStats {
        self.inner.read().queue_stats()
    }

    /// Per-worker load.
    pub fn workload(&self) -> BTreeMap<WorkerId, WorkerLoad> {
        self.inner.read().workload()
    }

    /// Dashboard snapshot under the read lock.
    pub fn dashboard(&self) -> DashboardSnapshot {
        DashboardSnapshot::capture(&self.inner.read())
    }

    /// Health under the read lock.
    pub fn health(&self) -> Health {
        health(&self.inner.read())
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&TriageEngine<S>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access, as one atomic step.
    pub fn write<R>(&self, f: impl FnOnce(&mut TriageEngine<S>) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl<S: ScoringPolicy> From<TriageEngine<S>> for SharedEngine<S> {
    fn from(engine: TriageEngine<S>) -> Self {
        Self::new(engine)
    }
}
