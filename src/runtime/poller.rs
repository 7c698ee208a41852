//! Pull ingestion from a document store into a shared engine.

use std::collections::HashSet;
use std::ops::AddAssign;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{EntityId, ScoringPolicy, Submission, TriageError};
use crate::infra::source::DocumentSource;
use crate::runtime::shared::SharedEngine;

/// Counts from one or more polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records returned by the source, minus those already handled at the
    /// watermark.
    pub fetched: usize,
    /// Records submitted to the engine.
    pub accepted: usize,
    /// Records whose id the engine already knew.
    pub duplicates: usize,
    /// Records whose fields could not be decoded.
    pub rejected: usize,
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.fetched += other.fetched;
        self.accepted += other.accepted;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
    }
}

/// Polls one collection and submits new records.
///
/// The watermark only moves forward. Records at the watermark are fetched again
/// on the next poll so nothing stamped with the same millisecond is lost; ids
/// already handled at that millisecond are dropped before decoding and are not
/// counted again.
pub struct IngestPoller<S: ScoringPolicy> {
    engine: SharedEngine<S>,
    source: Arc<dyn DocumentSource>,
    collection: String,
    watermark_ms: u128,
    seen_at_watermark: HashSet<EntityId>,
}

impl<S> IngestPoller<S>
where
    S: ScoringPolicy,
    S::Inputs: DeserializeOwned,
{
    /// Poll `collection` of `source` into `engine`, starting at `since_ms`.
    pub fn new(
        engine: SharedEngine<S>,
        source: Arc<dyn DocumentSource>,
        collection: impl Into<String>,
        since_ms: u128,
    ) -> Self {
        Self {
            engine,
            source,
            collection: collection.into(),
            watermark_ms: since_ms,
            seen_at_watermark: HashSet::new(),
        }
    }

    /// Timestamp of the newest record seen.
    pub const fn watermark_ms(&self) -> u128 {
        self.watermark_ms
    }

    /// Fetch once and submit every new record.
    ///
    /// # Errors
    ///
    /// Returns the source's error; the watermark is left unchanged.
    pub async fn poll_once(&mut self) -> Result<IngestReport, TriageError> {
        let since = self.watermark_ms;
        let records = self.source.fetch_recent(&self.collection, since).await?;
        let records: Vec<_> = records
            .into_iter()
            .filter(|r| !(r.submitted_at_ms == since && self.seen_at_watermark.contains(&r.id)))
            .collect();
        let mut report = IngestReport {
            fetched: records.len(),
            ..IngestReport::default()
        };

        let newest = records
            .iter()
            .map(|r| r.submitted_at_ms)
            .fold(since, u128::max);
        if newest > since {
            self.seen_at_watermark.clear();
        }
        self.watermark_ms = newest;

        for record in records {
            if record.submitted_at_ms == newest {
                self.seen_at_watermark.insert(record.id.clone());
            }
            let inputs: S::Inputs = match serde_json::from_value(record.fields) {
                Ok(inputs) => inputs,
                Err(e) => {
                    warn!(entity_id = %record.id, error = %e, "undecodable source record");
                    report.rejected += 1;
                    continue;
                }
            };
            let submission =
                Submission::new(record.id, inputs).with_submitted_at(record.submitted_at_ms);
            match self.engine.submit(submission) {
                Ok(_) => report.accepted += 1,
                Err(TriageError::DuplicateEntity(id)) => {
                    debug!(entity_id = %id, "record already ingested");
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!(error = %e, "source record rejected");
                    report.rejected += 1;
                }
            }
        }

        if report.accepted > 0 {
            info!(
                collection = %self.collection,
                accepted = report.accepted,
                watermark_ms = %self.watermark_ms,
                "ingested records"
            );
        }
        Ok(report)
    }

    /// Poll every `period` until `shutdown` turns true or its sender drops.
    /// Source errors are logged and the next tick retries. Returns the totals.
    #[cfg(feature = "tokio-runtime")]
    pub async fn run(
        mut self,
        period: std::time::Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> IngestReport {
        let mut ticker = tokio::time::interval(period);
        let mut total = IngestReport::default();
        loop {
            tokio::select! {
                _ = ticker.tick() => match self.poll_once().await {
                    Ok(report) => total += report,
                    Err(e) => {
                        warn!(collection = %self.collection, error = %e, "ingest poll failed");
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(collection = %self.collection, ?total, "ingest poller stopped");
        total
    }
}
