//! Runtime surfaces: shared engine, actor, ingest poller and API models.

#[cfg(not(target_arch = "wasm32"))]
pub mod actor;
pub mod api;
pub mod poller;
pub mod shared;

#[cfg(not(target_arch = "wasm32"))]
pub use actor::{EngineActor, EngineHandle};
pub use api::{health, DashboardSnapshot, Health};
pub use poller::{IngestPoller, IngestReport};
pub use shared::SharedEngine;
