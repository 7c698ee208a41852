//! Domain scoring policies.
//!
//! Each policy plugs one domain into the shared engine; the queueing and
//! assignment machinery is identical across them.

pub mod explicit;
pub mod lab;
pub mod patient;
pub mod restock;

pub use explicit::{ExplicitInputs, ExplicitPolicy};
pub use lab::{LabOrderInputs, LabOrderPolicy, LabTest};
pub use patient::{Consciousness, PatientInputs, PatientPolicy, VitalSigns};
pub use restock::{RestockPolicy, StockInputs};
