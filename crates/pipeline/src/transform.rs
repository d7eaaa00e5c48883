//! Transform stage
//!
//! Maps each envelope's payload through a function. A `None` result
//! forwards nothing; errors halt the pipeline.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sluice_protocol::{
    EncodedInsertBatch, Envelope, LogPayload, MessageProcessor, ProcessedMessage,
    ProcessingStep, Result, StepError, TransformedMessage,
};

use crate::PipelineMetrics;

/// Applies `function` to every envelope and forwards the results
pub struct TransformStep<T, U, F> {
    function: F,
    next: Box<dyn ProcessingStep<U>>,
    closed: bool,
    _input: PhantomData<fn(T)>,
}

impl<T, U, F> TransformStep<T, U, F>
where
    F: Fn(&Envelope<T>) -> Result<Option<U>>,
{
    /// Create a transform stage in front of `next`
    pub fn new(function: F, next: Box<dyn ProcessingStep<U>>) -> Self {
        Self {
            function,
            next,
            closed: false,
            _input: PhantomData,
        }
    }
}

#[async_trait]
impl<T, U, F> ProcessingStep<T> for TransformStep<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(&Envelope<T>) -> Result<Option<U>> + Send + Sync,
{
    async fn poll(&mut self) -> Result<()> {
        self.next.poll().await
    }

    async fn submit(&mut self, envelope: Envelope<T>) -> Result<()> {
        if self.closed {
            return Err(StepError::InvalidState("transform step is closed"));
        }

        match (self.function)(&envelope)? {
            Some(payload) => self.next.submit(envelope.replace_payload(payload)).await,
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.next.close().await
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.next.join(timeout).await
    }
}

/// Decode, process, and encode one raw message
///
/// The payload value is parsed as JSON and handed to the processor along
/// with its source coordinates. Insert rows are encoded to `JSONEachRow`
/// bytes; replacements pass through untouched.
#[derive(Clone)]
pub struct ProcessMessage {
    processor: Arc<dyn MessageProcessor>,
    metrics: Arc<PipelineMetrics>,
}

impl ProcessMessage {
    /// Wrap a message processor
    pub fn new(processor: Arc<dyn MessageProcessor>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { processor, metrics }
    }

    /// Process one raw envelope
    ///
    /// # Errors
    ///
    /// `StepError::Processing` if the payload is not valid JSON, the
    /// processor rejects it, or a row cannot be encoded.
    pub fn apply(&self, envelope: &Envelope<LogPayload>) -> Result<Option<TransformedMessage>> {
        let offset = envelope.offset();

        let value: serde_json::Value = serde_json::from_slice(&envelope.payload().value)
            .map_err(|e| StepError::processing(offset, format!("invalid JSON payload: {e}")))?;

        let processed = self
            .processor
            .process(value, &envelope.metadata())
            .map_err(|e| StepError::processing(offset, e.to_string()))?;

        match processed {
            None => {
                self.metrics.record_skipped();
                Ok(None)
            }
            Some(ProcessedMessage::Insert(batch)) => {
                self.metrics.record_insert();
                let encoded = EncodedInsertBatch::encode(batch).map_err(|e| {
                    StepError::processing(offset, format!("failed to encode row: {e}"))
                })?;
                Ok(Some(TransformedMessage::Insert(encoded)))
            }
            Some(ProcessedMessage::Replacement(batch)) => {
                self.metrics.record_replacement();
                Ok(Some(TransformedMessage::Replacement(batch)))
            }
        }
    }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;
