//! Collect stage
//!
//! Accumulates envelopes into a window backed by a fresh batch sink, and
//! flushes the window once it is large enough or old enough. A flush closes
//! the sink, waits for every write to be acknowledged, and only then
//! commits the highest offset seen per partition.
//!
//! A failed flush or a rejected envelope leaves the step failed: its
//! buffered envelopes were never written, so no later window may commit
//! past them. Every further call returns `InvalidState`.
//!
//! ```text
//!   submit ──> [no window] ──open──> [window: sink, offsets, size]
//!                                        │ size >= max || age >= max
//!                                        v
//!                            sink.close() -> sink.join() -> commit(offsets)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sluice_protocol::{Envelope, Offsets, ProcessingStep, Result, StepError};
use tokio::time::Instant;

use crate::PipelineMetrics;

/// Commit callback invoked after a window is durably written
pub trait Commit: Send {
    /// Commit the highest offset written per partition
    fn commit(&mut self, offsets: Offsets) -> Result<()>;
}

impl<F> Commit for F
where
    F: FnMut(Offsets) -> Result<()> + Send,
{
    fn commit(&mut self, offsets: Offsets) -> Result<()> {
        self(offsets)
    }
}

/// Builds the batch sink for a new window
pub type SinkFactory<T> = Box<dyn Fn() -> Box<dyn ProcessingStep<T>> + Send + Sync>;

/// Window thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectConfig {
    /// Envelopes per window before a flush
    pub max_batch_size: usize,
    /// Window age before a flush
    pub max_batch_time: Duration,
    /// Bound on waiting for a flushed window's writes; `None` waits forever
    pub flush_timeout: Option<Duration>,
}

struct Window<T> {
    sink: Box<dyn ProcessingStep<T>>,
    offsets: Offsets,
    size: usize,
    opened: Instant,
}

/// Windowing stage in front of the batch sink
pub struct CollectStep<T> {
    build_sink: SinkFactory<T>,
    commit: Box<dyn Commit>,
    config: CollectConfig,
    window: Option<Window<T>>,
    closed: bool,
    failed: bool,
    metrics: Arc<PipelineMetrics>,
}

impl<T: Send + 'static> CollectStep<T> {
    /// Create a collect stage
    pub fn new(
        build_sink: SinkFactory<T>,
        commit: Box<dyn Commit>,
        config: CollectConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            build_sink,
            commit,
            config,
            window: None,
            closed: false,
            failed: false,
            metrics,
        }
    }

    /// Envelopes in the open window
    #[inline]
    pub fn pending(&self) -> usize {
        self.window.as_ref().map_or(0, |w| w.size)
    }

    /// Whether an earlier failure stopped the step
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn ensure_healthy(&self) -> Result<()> {
        if self.failed {
            return Err(StepError::InvalidState("collect step failed earlier"));
        }
        Ok(())
    }

    fn window_expired(&self) -> bool {
        self.window
            .as_ref()
            .is_some_and(|w| w.opened.elapsed() >= self.config.max_batch_time)
    }

    /// Close and join the open window, then commit its offsets
    ///
    /// On failure nothing is committed and the step is marked failed.
    async fn flush(&mut self, timeout: Option<Duration>) -> Result<()> {
        let result = self.try_flush(timeout).await;
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    async fn try_flush(&mut self, timeout: Option<Duration>) -> Result<()> {
        let Some(mut window) = self.window.take() else {
            return Ok(());
        };

        let started = Instant::now();
        window.sink.close().await?;
        window.sink.join(timeout).await?;

        let elapsed = started.elapsed();
        self.metrics.record_flush(window.size as u64, elapsed);
        tracing::debug!(
            messages = window.size,
            partitions = window.offsets.len(),
            age_ms = window.opened.elapsed().as_millis() as u64,
            flush_ms = elapsed.as_millis() as u64,
            "window flushed"
        );

        self.commit.commit(window.offsets).map_err(|e| match e {
            StepError::Commit(_) => e,
            other => StepError::commit(other.to_string()),
        })?;
        self.metrics.record_commit();
        Ok(())
    }
}

#[async_trait]
impl<T: Send + 'static> ProcessingStep<T> for CollectStep<T> {
    async fn poll(&mut self) -> Result<()> {
        self.ensure_healthy()?;
        if self.window_expired() {
            self.flush(self.config.flush_timeout).await?;
        }
        Ok(())
    }

    async fn submit(&mut self, envelope: Envelope<T>) -> Result<()> {
        if self.closed {
            return Err(StepError::InvalidState("collect step is closed"));
        }
        self.ensure_healthy()?;

        let window = self.window.get_or_insert_with(|| Window {
            sink: (self.build_sink)(),
            offsets: Offsets::new(),
            size: 0,
            opened: Instant::now(),
        });

        let partition = envelope.partition().clone();
        let offset = envelope.offset();
        if let Err(e) = window.sink.submit(envelope).await {
            self.failed = true;
            return Err(e);
        }

        window
            .offsets
            .entry(partition)
            .and_modify(|o| *o = (*o).max(offset))
            .or_insert(offset);
        window.size += 1;

        if window.size >= self.config.max_batch_size || self.window_expired() {
            self.flush(self.config.flush_timeout).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.ensure_healthy()?;
        self.flush(timeout).await
    }
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod collect_test;
