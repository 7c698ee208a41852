//! Entity, tier and lifecycle types shared by every triage component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a triaged entity (patient, lab order, restock line, ticket).
pub type EntityId = String;

/// Identifier of a worker (doctor, technician, buyer, agent).
pub type WorkerId = String;

/// Discrete priority class. Declaration order is service order:
/// `Critical < Emergency < Urgent < SemiUrgent < Routine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    /// Life-threatening or stock-out; always served first.
    Critical,
    /// Needs attention within minutes.
    Emergency,
    /// Needs prompt attention.
    Urgent,
    /// Can wait but must not be forgotten.
    SemiUrgent,
    /// Routine work.
    Routine,
}

impl ScoreTier {
    /// All tiers in service order.
    pub const ALL: [Self; 5] = [
        Self::Critical,
        Self::Emergency,
        Self::Urgent,
        Self::SemiUrgent,
        Self::Routine,
    ];

    /// Ordinal used by the score composition (1 = Critical .. 5 = Routine).
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::Emergency => 2,
            Self::Urgent => 3,
            Self::SemiUrgent => 4,
            Self::Routine => 5,
        }
    }

    /// The highest tier.
    pub const fn top() -> Self {
        Self::Critical
    }

    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Emergency => "emergency",
            Self::Urgent => "urgent",
            Self::SemiUrgent => "semi_urgent",
            Self::Routine => "routine",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an entity owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    /// Queued, not yet assigned to a worker.
    Waiting,
    /// Assigned to a worker, work not yet started.
    Assigned,
    /// Worker has started.
    InProgress,
    /// Finished.
    Completed,
    /// Withdrawn before finishing.
    Cancelled,
}

impl EntityStatus {
    /// Completed or Cancelled.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Holds a worker slot (Assigned or InProgress).
    pub const fn holds_worker(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Waiting => "waiting",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Urgency score and the tier that dominates it. Lower `value` is served sooner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Composite score.
    pub value: f64,
    /// Tier the score was derived from.
    pub tier: ScoreTier,
}

impl Score {
    /// Build a score from its parts.
    pub const fn new(value: f64, tier: ScoreTier) -> Self {
        Self { value, tier }
    }
}

/// A new entity handed to the engine.
#[derive(Debug, Clone)]
pub struct Submission<I> {
    /// Unique identifier.
    pub id: EntityId,
    /// Domain scoring inputs.
    pub inputs: I,
    /// Arrival time; defaults to the engine clock at submission.
    pub submitted_at_ms: Option<u128>,
}

impl<I> Submission<I> {
    /// Submission arriving now.
    pub fn new(id: impl Into<EntityId>, inputs: I) -> Self {
        Self {
            id: id.into(),
            inputs,
            submitted_at_ms: None,
        }
    }

    /// Override the arrival time (e.g. the source record's timestamp).
    #[must_use]
    pub fn with_submitted_at(mut self, submitted_at_ms: u128) -> Self {
        self.submitted_at_ms = Some(submitted_at_ms);
        self
    }
}

/// Authoritative engine-side record of an entity.
#[derive(Debug, Clone)]
pub struct EntityRecord<I> {
    /// Unique identifier.
    pub id: EntityId,
    /// Current scoring inputs.
    pub inputs: I,
    /// Score computed from the current inputs.
    pub score: Score,
    /// Lifecycle status.
    pub status: EntityStatus,
    /// Tags a worker must carry to be eligible.
    pub required_tags: Vec<String>,
    /// Arrival time.
    pub submitted_at_ms: u128,
    /// When a worker was chosen.
    pub assigned_at_ms: Option<u128>,
    /// When the entity reached Completed or Cancelled.
    pub finished_at_ms: Option<u128>,
    /// Worker holding (or last holding) the entity.
    pub assigned_worker: Option<WorkerId>,
    /// Expected service time from the policy, if it gives one.
    pub estimated_duration_ms: Option<u128>,
}

impl<I> EntityRecord<I> {
    /// Current tier.
    pub const fn tier(&self) -> ScoreTier {
        self.score.tier
    }

    /// Milliseconds spent waiting: until assignment if assigned, else until `now_ms`.
    pub fn waited_ms(&self, now_ms: u128) -> u128 {
        let end = match (self.assigned_at_ms, self.finished_at_ms) {
            (Some(assigned), _) => assigned,
            (None, Some(finished)) => finished,
            (None, None) => now_ms,
        };
        end.saturating_sub(self.submitted_at_ms)
    }
}
