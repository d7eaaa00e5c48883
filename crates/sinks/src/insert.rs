//! Insert writer
//!
//! Buffers encoded rows for one storage and writes them with a single bulk
//! call when closed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sluice_protocol::{Envelope, ProcessingStep, Result, StepError};

use crate::{BatchWriter, SinkMetrics};

/// Per-storage row buffer in front of a `BatchWriter`
pub struct InsertBatchWriter {
    writer: Arc<dyn BatchWriter>,
    rows: Vec<Bytes>,
    closed: bool,
    metrics: Arc<SinkMetrics>,
}

impl InsertBatchWriter {
    /// Create an empty insert writer
    pub fn new(writer: Arc<dyn BatchWriter>, metrics: Arc<SinkMetrics>) -> Self {
        Self {
            writer,
            rows: Vec::new(),
            closed: false,
            metrics,
        }
    }

    /// Rows buffered so far
    #[inline]
    pub fn buffered(&self) -> usize {
        self.rows.len()
    }

    /// Destination name
    #[inline]
    pub fn name(&self) -> &str {
        self.writer.name()
    }
}

#[async_trait]
impl ProcessingStep<Vec<Bytes>> for InsertBatchWriter {
    async fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    async fn submit(&mut self, envelope: Envelope<Vec<Bytes>>) -> Result<()> {
        if self.closed {
            return Err(StepError::InvalidState("insert writer is closed"));
        }
        self.rows.extend(envelope.into_payload());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.rows.is_empty() {
            return Ok(());
        }

        let rows = std::mem::take(&mut self.rows);
        let count = rows.len() as u64;
        let bytes: u64 = rows.iter().map(|r| r.len() as u64).sum();

        match self.writer.write(rows).await {
            Ok(()) => {
                self.metrics.batch_written(count, bytes);
                tracing::debug!(
                    destination = %self.writer.name(),
                    rows = count,
                    bytes,
                    "rows written"
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                tracing::error!(
                    destination = %self.writer.name(),
                    rows = count,
                    error = %e,
                    "bulk write failed"
                );
                Err(e.into_step_error(self.writer.name()))
            }
        }
    }

    async fn join(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "insert_test.rs"]
mod insert_test;
