//! Single-threaded actor owning a [`TriageEngine`].
//!
//! One dedicated thread drains a bounded `crossbeam-channel` inbox and applies
//! commands in arrival order, which serializes every operation without a lock.
//! Each request carries its own reply channel.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info};

use crate::core::{
    EntityId, QueueStats, ScoringPolicy, ServedEntity, SubmitReceipt, Submission, TriageEngine,
    TriageError, WorkerId,
};
use crate::runtime::api::DashboardSnapshot;

enum Command<S: ScoringPolicy> {
    Submit(Submission<S::Inputs>, Sender<Result<SubmitReceipt, TriageError>>),
    ServeNext(Sender<Option<ServedEntity>>),
    UpdateInputs(EntityId, S::Inputs, Sender<bool>),
    Start(EntityId, Sender<bool>),
    Complete(EntityId, Sender<bool>),
    Cancel(EntityId, Sender<bool>),
    RegisterWorker {
        worker_id: WorkerId,
        capacity: u32,
        tags: Vec<String>,
        reply: Sender<Result<(), TriageError>>,
    },
    DeregisterWorker(WorkerId, Sender<bool>),
    QueueStats(Sender<QueueStats>),
    Dashboard(Sender<DashboardSnapshot>),
    Shutdown,
}

/// Spawner for engine actor threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineActor;

impl EngineActor {
    /// Move `engine` onto a dedicated thread with an inbox of `inbox_capacity`
    /// pending commands. Joining the returned handle after
    /// [`EngineHandle::shutdown`] gives the engine back.
    ///
    /// # Errors
    ///
    /// Fails if the OS refuses to spawn the thread.
    pub fn spawn<S: ScoringPolicy>(
        engine: TriageEngine<S>,
        inbox_capacity: usize,
    ) -> std::io::Result<(EngineHandle<S>, JoinHandle<TriageEngine<S>>)> {
        let (tx, rx) = bounded(inbox_capacity);
        let join = thread::Builder::new()
            .name(format!("triage-{}", engine.policy().name()))
            .spawn(move || run(engine, &rx))?;
        Ok((EngineHandle { tx }, join))
    }
}

fn run<S: ScoringPolicy>(
    mut engine: TriageEngine<S>,
    inbox: &Receiver<Command<S>>,
) -> TriageEngine<S> {
    info!(policy = engine.policy().name(), "engine actor started");
    // Replies to callers that gave up are dropped.
    while let Ok(command) = inbox.recv() {
        match command {
            Command::Submit(submission, reply) => {
                let _ = reply.send(engine.submit(submission));
            }
            Command::ServeNext(reply) => {
                let _ = reply.send(engine.serve_next());
            }
            Command::UpdateInputs(id, inputs, reply) => {
                let _ = reply.send(engine.update_inputs(&id, inputs));
            }
            Command::Start(id, reply) => {
                let _ = reply.send(engine.start(&id));
            }
            Command::Complete(id, reply) => {
                let _ = reply.send(engine.complete(&id));
            }
            Command::Cancel(id, reply) => {
                let _ = reply.send(engine.cancel(&id));
            }
            Command::RegisterWorker {
                worker_id,
                capacity,
                tags,
                reply,
            } => {
                let _ = reply.send(engine.register_worker(worker_id, capacity, tags));
            }
            Command::DeregisterWorker(id, reply) => {
                let _ = reply.send(engine.deregister_worker(&id));
            }
            Command::QueueStats(reply) => {
                let _ = reply.send(engine.queue_stats());
            }
            Command::Dashboard(reply) => {
                let _ = reply.send(DashboardSnapshot::capture(&engine));
            }
            Command::Shutdown => {
                debug!("engine actor received shutdown");
                break;
            }
        }
    }
    info!("engine actor stopped");
    engine
}

/// Cloneable sender side of an engine actor.
///
/// Every method blocks until the actor replies, and fails with
/// `TriageError::EngineStopped` once the actor has exited.
pub struct EngineHandle<S: ScoringPolicy> {
    tx: Sender<Command<S>>,
}

impl<S: ScoringPolicy> Clone for EngineHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S: ScoringPolicy> EngineHandle<S> {
    fn request<R>(&self, make: impl FnOnce(Sender<R>) -> Command<S>) -> Result<R, TriageError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx
            .send(make(reply_tx))
            .map_err(|_| TriageError::EngineStopped)?;
        reply_rx.recv().map_err(|_| TriageError::EngineStopped)
    }

    /// Submit an entity.
    ///
    /// # Errors
    ///
    /// `DuplicateEntity` from the engine, or `EngineStopped`.
    pub fn submit(&self, submission: Submission<S::Inputs>) -> Result<SubmitReceipt, TriageError> {
        self.request(|reply| Command::Submit(submission, reply))?
    }

    /// Serve the next entity.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn serve_next(&self) -> Result<Option<ServedEntity>, TriageError> {
        self.request(Command::ServeNext)
    }

    /// Update a waiting entity's inputs.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn update_inputs(
        &self,
        entity_id: impl Into<EntityId>,
        inputs: S::Inputs,
    ) -> Result<bool, TriageError> {
        let entity_id = entity_id.into();
        self.request(|reply| Command::UpdateInputs(entity_id, inputs, reply))
    }

    /// Mark an assigned entity as started.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn start(&self, entity_id: impl Into<EntityId>) -> Result<bool, TriageError> {
        let entity_id = entity_id.into();
        self.request(|reply| Command::Start(entity_id, reply))
    }

    /// Complete an entity.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn complete(&self, entity_id: impl Into<EntityId>) -> Result<bool, TriageError> {
        let entity_id = entity_id.into();
        self.request(|reply| Command::Complete(entity_id, reply))
    }

    /// Cancel an entity.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn cancel(&self, entity_id: impl Into<EntityId>) -> Result<bool, TriageError> {
        let entity_id = entity_id.into();
        self.request(|reply| Command::Cancel(entity_id, reply))
    }

    /// Register or update a worker.
    ///
    /// # Errors
    ///
    /// Registration errors from the engine, or `EngineStopped`.
    pub fn register_worker(
        &self,
        worker_id: impl Into<WorkerId>,
        capacity: u32,
        tags: Vec<String>,
    ) -> Result<(), TriageError> {
        let worker_id = worker_id.into();
        self.request(|reply| Command::RegisterWorker {
            worker_id,
            capacity,
            tags,
            reply,
        })?
    }

    /// Deregister an idle worker.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn deregister_worker(&self, worker_id: impl Into<WorkerId>) -> Result<bool, TriageError> {
        let worker_id = worker_id.into();
        self.request(|reply| Command::DeregisterWorker(worker_id, reply))
    }

    /// Live queue counts.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn queue_stats(&self) -> Result<QueueStats, TriageError> {
        self.request(Command::QueueStats)
    }

    /// Dashboard snapshot.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has exited.
    pub fn dashboard(&self) -> Result<DashboardSnapshot, TriageError> {
        self.request(Command::Dashboard)
    }

    /// Ask the actor to stop after the commands already queued.
    ///
    /// # Errors
    ///
    /// `EngineStopped` if the actor has already exited.
    pub fn shutdown(&self) -> Result<(), TriageError> {
        self.tx
            .send(Command::Shutdown)
            .map_err(|_| TriageError::EngineStopped)
    }
}
