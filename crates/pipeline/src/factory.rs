//! Streaming strategy factory
//!
//! Validates the pipeline parameters once, then builds a fresh processing
//! chain per assignment:
//!
//! ```text
//! [FilterStep] -> TransformStep(ProcessMessage) -> CollectStep -> ProcessedMessageBatchWriter
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::{
    Envelope, LogPayload, MessageProcessor, ProcessingStep, Result, StepError, StorageKey,
    TransformedMessage,
};
use sluice_sinks::{BatchWriter, ReplacementTarget, SinkMetrics, WriterSet};

use crate::collect::{CollectConfig, CollectStep, Commit};
use crate::filter::{FilterStep, MessageFilter};
use crate::transform::{ProcessMessage, TransformStep};
use crate::PipelineMetrics;

/// Builds processing strategies for the stream consumer
pub struct StreamingStrategyFactory {
    prefilter: Option<Arc<dyn MessageFilter>>,
    processor: Arc<dyn MessageProcessor>,
    writers: WriterSet,
    collect: CollectConfig,
    metrics: Arc<PipelineMetrics>,
}

impl StreamingStrategyFactory {
    /// Create a factory
    ///
    /// Replacements are produced if and only if `replacements` is given.
    ///
    /// # Errors
    ///
    /// `StepError::Validation` if `max_batch_size` or `max_batch_time` is
    /// zero, or no writers are configured.
    pub fn new(
        processor: Arc<dyn MessageProcessor>,
        writers: BTreeMap<StorageKey, Arc<dyn BatchWriter>>,
        max_batch_size: usize,
        max_batch_time: Duration,
        replacements: Option<ReplacementTarget>,
    ) -> Result<Self> {
        if max_batch_size == 0 {
            return Err(StepError::validation("max_batch_size must be greater than zero"));
        }
        if max_batch_time.is_zero() {
            return Err(StepError::validation("max_batch_time must be greater than zero"));
        }
        if writers.is_empty() {
            return Err(StepError::validation("at least one storage writer is required"));
        }

        Ok(Self {
            prefilter: None,
            processor,
            writers: WriterSet::new(writers, replacements),
            collect: CollectConfig {
                max_batch_size,
                max_batch_time,
                flush_timeout: None,
            },
            metrics: Arc::new(PipelineMetrics::new()),
        })
    }

    /// Drop raw envelopes the filter rejects before decoding
    pub fn with_prefilter(mut self, filter: impl MessageFilter + 'static) -> Self {
        self.prefilter = Some(Arc::new(filter));
        self
    }

    /// Bound how long a size- or time-triggered flush may wait for writes
    pub fn with_flush_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.collect.flush_timeout = timeout;
        self
    }

    /// Window thresholds
    #[inline]
    pub fn collect_config(&self) -> CollectConfig {
        self.collect
    }

    /// Whether replacements are produced
    #[inline]
    pub fn replacements_enabled(&self) -> bool {
        self.writers.replacements_enabled()
    }

    /// Metrics shared by every strategy this factory creates
    #[inline]
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Writer metrics shared by every batch sink
    #[inline]
    pub fn sink_metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(self.writers.metrics())
    }

    /// Build a processing chain committing through `commit`
    pub fn create<C>(&self, commit: C) -> Box<dyn ProcessingStep<LogPayload>>
    where
        C: Commit + 'static,
    {
        let writers = self.writers.clone();
        let build_sink = Box::new(move || {
            Box::new(writers.build()) as Box<dyn ProcessingStep<TransformedMessage>>
        });

        let collect: Box<dyn ProcessingStep<TransformedMessage>> = Box::new(CollectStep::new(
            build_sink,
            Box::new(commit),
            self.collect,
            Arc::clone(&self.metrics),
        ));

        let process = ProcessMessage::new(Arc::clone(&self.processor), Arc::clone(&self.metrics));
        let transform = TransformStep::new(
            move |envelope: &Envelope<LogPayload>| process.apply(envelope),
            collect,
        );

        let strategy: Box<dyn ProcessingStep<LogPayload>> = Box::new(transform);
        match &self.prefilter {
            Some(filter) => Box::new(FilterStep::new(
                Arc::clone(filter),
                strategy,
                Arc::clone(&self.metrics),
            )),
            None => strategy,
        }
    }
}

impl std::fmt::Debug for StreamingStrategyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingStrategyFactory")
            .field("prefilter", &self.prefilter.is_some())
            .field("writers", &self.writers)
            .field("collect", &self.collect)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;
