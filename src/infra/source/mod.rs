//! Document-store pull contract.
//!
//! The engine never holds a store connection. A poller asks a
//! [`DocumentSource`] for records newer than a watermark and submits them.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, TriageError};

pub use memory::InMemoryDocumentSource;

/// Entity-shaped record as stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Entity identifier.
    pub id: EntityId,
    /// Collection the record came from.
    pub collection: String,
    /// Submission timestamp (ms since epoch).
    pub submitted_at_ms: u128,
    /// Scoring inputs, decoded by the consumer into its policy's input type.
    pub fields: serde_json::Value,
}

/// Pull-based document store.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_triage::core::TriageError;
/// use prometheus_triage::infra::{DocumentSource, SourceRecord};
///
/// struct MongoSource { /* client */ }
///
/// #[async_trait]
/// impl DocumentSource for MongoSource {
///     async fn fetch_recent(
///         &self,
///         collection: &str,
///         since_ms: u128,
///     ) -> Result<Vec<SourceRecord>, TriageError> {
///         // find({ collection, createdAt: { $gte: since_ms } })
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Records of `collection` submitted at or after `since_ms`, oldest first.
    async fn fetch_recent(
        &self,
        collection: &str,
        since_ms: u128,
    ) -> Result<Vec<SourceRecord>, TriageError>;
}
