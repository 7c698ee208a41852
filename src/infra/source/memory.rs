//! In-memory document source for tests and demos.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::TriageError;
use crate::infra::source::{DocumentSource, SourceRecord};

/// Document source backed by a vector of records.
#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
    records: Mutex<Vec<SourceRecord>>,
    fail_next: Mutex<Option<String>>,
}

impl InMemoryDocumentSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&self, record: SourceRecord) {
        self.records.lock().push(record);
    }

    /// Make the next fetch fail with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn fetch_recent(
        &self,
        collection: &str,
        since_ms: u128,
    ) -> Result<Vec<SourceRecord>, TriageError> {
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(TriageError::Source(reason));
        }
        let mut found: Vec<SourceRecord> = self
            .records
            .lock()
            .iter()
            .filter(|r| r.collection == collection && r.submitted_at_ms >= since_ms)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.submitted_at_ms
                .cmp(&b.submitted_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(found)
    }
}
