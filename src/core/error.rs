//! Error types for triage operations.
//!
//! Unknown ids and illegal lifecycle transitions are not errors: those
//! operations return `false` / `None`. Capacity exhaustion is normal control flow.

use thiserror::Error;

/// Errors produced by triage components.
#[derive(Debug, Error)]
pub enum TriageError {
    /// An entity with this id has already been submitted.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker re-registration would drop capacity below its current load.
    #[error("worker `{worker}` capacity {capacity} is below current load {load}")]
    CapacityBelowLoad {
        /// Worker identifier.
        worker: String,
        /// Requested capacity.
        capacity: u32,
        /// Load at the time of the request.
        load: u32,
    },
    /// Document-store collaborator failure with context.
    #[error("source error: {0}")]
    Source(String),
    /// The engine actor has shut down and can no longer accept requests.
    #[error("engine stopped")]
    EngineStopped,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
