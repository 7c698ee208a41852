//! Audit sink implementations.
//!
//! Every lifecycle transition the engine performs can be recorded to an
//! [`AuditSink`]. Recording happens inside the engine's critical section, so the
//! trail is in the same order as the transitions.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{EntityId, WorkerId};
use crate::util::clock::now_ms;

/// Lifecycle action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Entity accepted by the engine.
    Submitted,
    /// Entity handed to a worker.
    Assigned,
    /// Entity put back in the queue after a failed assignment.
    Requeued,
    /// Entity inputs changed while waiting.
    Rescored,
    /// Worker started on the entity.
    Started,
    /// Entity finished.
    Completed,
    /// Entity withdrawn.
    Cancelled,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Submitted => "submitted",
            Self::Assigned => "assigned",
            Self::Requeued => "requeued",
            Self::Rescored => "rescored",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related entity identifier.
    pub entity_id: EntityId,
    /// Worker involved, if any.
    pub worker_id: Option<WorkerId>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// A shared sink is itself a sink, so callers can keep a handle for inspection.
impl<T: AuditSink> AuditSink for Arc<Mutex<T>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// In-memory audit sink for testing and dev.
#[derive(Debug)]
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Create a sink already wrapped for sharing with an engine.
    pub fn shared(max_events: usize) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new(max_events)))
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Events recorded for one entity, oldest first.
    pub fn events_for(&self, entity_id: &str) -> Vec<AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event stamped with a fresh id.
pub fn build_audit_event(
    entity_id: impl Into<EntityId>,
    worker_id: Option<WorkerId>,
    action: AuditAction,
    created_at_ms: Option<u128>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4().to_string(),
        entity_id: entity_id.into(),
        worker_id,
        action,
        created_at_ms: created_at_ms.unwrap_or_else(now_ms),
        detail,
    }
}
