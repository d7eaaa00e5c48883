//! Replacement writer
//!
//! Replays replacement instructions through the outbound topic. Each value
//! becomes one message keyed by its batch key; `join` waits until the
//! producer has acknowledged every message.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sluice_protocol::{
    Deadline, Envelope, ProcessingStep, ReplacementBatch, Result, StepError, Topic,
};

use crate::producer::{DeliveryFuture, Producer};
use crate::SinkMetrics;

/// Producer and topic replacements are sent to
#[derive(Clone)]
pub struct ReplacementTarget {
    /// Shared outbound producer
    pub producer: Arc<dyn Producer>,
    /// Outbound topic
    pub topic: Topic,
}

impl ReplacementTarget {
    /// Create a replacement target
    pub fn new(producer: Arc<dyn Producer>, topic: Topic) -> Self {
        Self { producer, topic }
    }
}

impl std::fmt::Debug for ReplacementTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplacementTarget")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

/// One replacement batch, encoded at submit time
struct EncodedReplacement {
    key: Bytes,
    values: Vec<Bytes>,
}

/// Buffers replacement batches and produces them on close
pub struct ReplacementBatchWriter {
    target: ReplacementTarget,
    batches: Vec<EncodedReplacement>,
    deliveries: VecDeque<DeliveryFuture>,
    closed: bool,
    metrics: Arc<SinkMetrics>,
}

impl ReplacementBatchWriter {
    /// Create an empty replacement writer
    pub fn new(target: ReplacementTarget, metrics: Arc<SinkMetrics>) -> Self {
        Self {
            target,
            batches: Vec::new(),
            deliveries: VecDeque::new(),
            closed: false,
            metrics,
        }
    }

    /// Deliveries not yet awaited
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.deliveries.len()
    }

    /// Encode every value of the batch received at `offset`
    fn encode(batch: ReplacementBatch, offset: u64) -> Result<EncodedReplacement> {
        let values = batch
            .values
            .iter()
            .map(|value| {
                serde_json::to_vec(value)
                    .map(Bytes::from)
                    .map_err(|e| encoding_error(offset, e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EncodedReplacement {
            key: Bytes::from(batch.key.into_bytes()),
            values,
        })
    }
}

fn encoding_error(offset: u64, e: serde_json::Error) -> StepError {
    StepError::processing(offset, format!("failed to encode replacement: {e}"))
}

#[async_trait]
impl ProcessingStep<ReplacementBatch> for ReplacementBatchWriter {
    async fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    async fn submit(&mut self, envelope: Envelope<ReplacementBatch>) -> Result<()> {
        if self.closed {
            return Err(StepError::InvalidState("replacement writer is closed"));
        }
        let offset = envelope.offset();
        let encoded = Self::encode(envelope.into_payload(), offset)?;
        self.batches.push(encoded);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut produced = 0u64;
        for batch in std::mem::take(&mut self.batches) {
            for value in batch.values {
                let delivery = self
                    .target
                    .producer
                    .produce(&self.target.topic, batch.key.clone(), value)?;
                self.deliveries.push_back(delivery);
                produced += 1;
            }
        }

        if produced > 0 {
            self.metrics.replacements_produced(produced);
            tracing::debug!(
                topic = %self.target.topic,
                messages = produced,
                "replacements produced"
            );
        }
        Ok(())
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<()> {
        let deadline = Deadline::new(timeout);

        deadline
            .run(self.target.producer.flush(deadline.remaining()))
            .await??;

        // A delivery stays queued until it resolves, so a timed-out join
        // can be retried.
        while let Some(delivery) = self.deliveries.front_mut() {
            let outcome = deadline.run(delivery).await?;
            self.deliveries.pop_front();
            outcome?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "replacement_test.rs"]
mod replacement_test;
