//! Filter stage
//!
//! Drops raw envelopes before they are decoded. The pre-filter decides on
//! the raw payload alone (typically its headers), so rejected messages
//! never pay for JSON parsing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sluice_protocol::{Envelope, LogPayload, ProcessingStep, Result, StepError};

use crate::PipelineMetrics;

/// Pre-filter predicate over raw envelopes
pub trait MessageFilter: Send + Sync {
    /// Whether the envelope should be dropped
    fn should_drop(&self, envelope: &Envelope<LogPayload>) -> bool;
}

impl<F> MessageFilter for F
where
    F: Fn(&Envelope<LogPayload>) -> bool + Send + Sync,
{
    fn should_drop(&self, envelope: &Envelope<LogPayload>) -> bool {
        self(envelope)
    }
}

/// Drops envelopes whose header `name` carries exactly `value`
///
/// Used to skip messages that another consumer owns, e.g. replication
/// control messages tagged by the producer.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    name: String,
    value: Bytes,
}

impl HeaderFilter {
    /// Create a header filter
    pub fn new(name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl MessageFilter for HeaderFilter {
    fn should_drop(&self, envelope: &Envelope<LogPayload>) -> bool {
        envelope
            .payload()
            .header(&self.name)
            .is_some_and(|v| *v == self.value)
    }
}

/// Forwards only the envelopes the filter accepts
pub struct FilterStep {
    filter: Arc<dyn MessageFilter>,
    next: Box<dyn ProcessingStep<LogPayload>>,
    closed: bool,
    metrics: Arc<PipelineMetrics>,
}

impl FilterStep {
    /// Create a filter stage in front of `next`
    pub fn new(
        filter: Arc<dyn MessageFilter>,
        next: Box<dyn ProcessingStep<LogPayload>>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            filter,
            next,
            closed: false,
            metrics,
        }
    }
}

#[async_trait]
impl ProcessingStep<LogPayload> for FilterStep {
    async fn poll(&mut self) -> Result<()> {
        self.next.poll().await
    }

    async fn submit(&mut self, envelope: Envelope<LogPayload>) -> Result<()> {
        if self.closed {
            return Err(StepError::InvalidState("filter step is closed"));
        }

        if self.filter.should_drop(&envelope) {
            self.metrics.record_filtered();
            tracing::trace!(
                partition = %envelope.partition(),
                offset = envelope.offset(),
                "message dropped by filter"
            );
            return Ok(());
        }

        self.next.submit(envelope).await
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.next.close().await
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.next.join(timeout).await
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;
