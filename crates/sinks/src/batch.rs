//! Batch sink
//!
//! Fans a window of transformed messages out to the per-storage insert
//! writers and the optional replacement writer. A fresh sink is built for
//! every window from a `WriterSet`.
//!
//! ```text
//!                          ┌─> InsertBatchWriter(errors) ──> BatchWriter
//! TransformedMessage ──────┼─> InsertBatchWriter(transactions) ──> BatchWriter
//!                          └─> ReplacementBatchWriter ──> Producer
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sluice_protocol::{
    Deadline, Envelope, ProcessingStep, Result, StepError, StorageKey, TransformedMessage,
};

use crate::insert::InsertBatchWriter;
use crate::replacement::{ReplacementBatchWriter, ReplacementTarget};
use crate::{BatchWriter, SinkMetrics};

/// Long-lived destinations a batch sink is built from
///
/// Built once at pipeline construction and shared by every window.
#[derive(Clone)]
pub struct WriterSet {
    writers: BTreeMap<StorageKey, Arc<dyn BatchWriter>>,
    replacements: Option<ReplacementTarget>,
    metrics: Arc<SinkMetrics>,
}

impl WriterSet {
    /// Create a writer set
    pub fn new(
        writers: BTreeMap<StorageKey, Arc<dyn BatchWriter>>,
        replacements: Option<ReplacementTarget>,
    ) -> Self {
        Self {
            writers,
            replacements,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Storage keys with a configured writer
    pub fn storages(&self) -> impl Iterator<Item = &StorageKey> {
        self.writers.keys()
    }

    /// Whether no writers are configured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Whether replacements are produced
    #[inline]
    pub fn replacements_enabled(&self) -> bool {
        self.replacements.is_some()
    }

    /// Metrics shared by every sink built from this set
    #[inline]
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Build an empty batch sink for a new window
    pub fn build(&self) -> ProcessedMessageBatchWriter {
        let inserts = self
            .writers
            .iter()
            .map(|(key, writer)| {
                (
                    key.clone(),
                    InsertBatchWriter::new(Arc::clone(writer), Arc::clone(&self.metrics)),
                )
            })
            .collect();

        let replacements = self
            .replacements
            .clone()
            .map(|target| ReplacementBatchWriter::new(target, Arc::clone(&self.metrics)));

        ProcessedMessageBatchWriter {
            inserts,
            replacements,
            closed: false,
        }
    }
}

impl std::fmt::Debug for WriterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSet")
            .field("storages", &self.writers.keys().collect::<Vec<_>>())
            .field("replacements", &self.replacements)
            .finish()
    }
}

/// Batch sink for one window
pub struct ProcessedMessageBatchWriter {
    inserts: BTreeMap<StorageKey, InsertBatchWriter>,
    replacements: Option<ReplacementBatchWriter>,
    closed: bool,
}

impl ProcessedMessageBatchWriter {
    /// Group rows by storage, keeping append order within each storage
    fn group_rows(rows: Vec<(StorageKey, Bytes)>) -> BTreeMap<StorageKey, Vec<Bytes>> {
        let mut groups: BTreeMap<StorageKey, Vec<Bytes>> = BTreeMap::new();
        for (key, row) in rows {
            groups.entry(key).or_default().push(row);
        }
        groups
    }
}

#[async_trait]
impl ProcessingStep<TransformedMessage> for ProcessedMessageBatchWriter {
    async fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    async fn submit(&mut self, envelope: Envelope<TransformedMessage>) -> Result<()> {
        if self.closed {
            return Err(StepError::InvalidState("batch sink is closed"));
        }

        let coordinates = envelope.replace_payload(());
        match envelope.into_payload() {
            TransformedMessage::Insert(batch) => {
                let groups = Self::group_rows(batch.rows);

                // Reject the whole message before any group is buffered.
                if let Some(key) = groups.keys().find(|k| !self.inserts.contains_key(*k)) {
                    return Err(StepError::UnknownStorage(key.clone()));
                }

                for (key, rows) in groups {
                    if let Some(writer) = self.inserts.get_mut(&key) {
                        writer.submit(coordinates.replace_payload(rows)).await?;
                    }
                }
                Ok(())
            }
            TransformedMessage::Replacement(batch) => match self.replacements.as_mut() {
                Some(writer) => writer.submit(coordinates.replace_payload(batch)).await,
                None => Err(StepError::UnsupportedOperation(
                    "replacements are not enabled",
                )),
            },
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;

        for writer in self.inserts.values_mut() {
            writer.close().await?;
        }
        if let Some(writer) = self.replacements.as_mut() {
            writer.close().await?;
        }
        Ok(())
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<()> {
        let deadline = Deadline::new(timeout);

        for writer in self.inserts.values_mut() {
            writer.join(deadline.remaining()).await?;
        }
        if let Some(writer) = self.replacements.as_mut() {
            writer.join(deadline.remaining()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
