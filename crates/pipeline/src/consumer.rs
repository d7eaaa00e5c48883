//! Stream consumer
//!
//! Drives a processing strategy from the source adapter's delivery
//! channel. Envelopes are submitted in arrival order; a poll tick lets
//! idle windows flush on time. When the channel closes or the consumer is
//! cancelled, the strategy is closed and joined so the last window is
//! written and committed.
//!
//! Any error stops the consumer and is returned to the caller, who is
//! expected to restart from the last committed offsets.

use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::{Envelope, LogPayload, ProcessingStep, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::collect::Commit;
use crate::factory::StreamingStrategyFactory;
use crate::{MetricsSnapshot, PipelineMetrics};

/// Default interval between time-threshold checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs one strategy until its input ends
pub struct StreamConsumer {
    strategy: Box<dyn ProcessingStep<LogPayload>>,
    poll_interval: Duration,
    shutdown_timeout: Option<Duration>,
    metrics: Arc<PipelineMetrics>,
}

impl StreamConsumer {
    /// Create a consumer around a fresh strategy from `factory`
    pub fn new<C>(factory: &StreamingStrategyFactory, commit: C) -> Self
    where
        C: Commit + 'static,
    {
        Self {
            strategy: factory.create(commit),
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_timeout: None,
            metrics: factory.metrics(),
        }
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the final flush at shutdown; `None` waits forever
    pub fn with_shutdown_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Run until the channel closes
    pub async fn run(self, receiver: mpsc::Receiver<Envelope<LogPayload>>) -> Result<MetricsSnapshot> {
        self.run_until(receiver, CancellationToken::new()).await
    }

    /// Run until the channel closes or `cancel` fires
    ///
    /// Envelopes still queued in the channel at cancellation are not
    /// submitted; they were never committed and will be redelivered.
    pub async fn run_until(
        mut self,
        mut receiver: mpsc::Receiver<Envelope<LogPayload>>,
        cancel: CancellationToken,
    ) -> Result<MetricsSnapshot> {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "stream consumer starting"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("stream consumer cancelled");
                    break;
                }
                received = receiver.recv() => {
                    let Some(envelope) = received else {
                        tracing::info!("input channel closed");
                        break;
                    };
                    self.metrics.record_received();
                    let partition = envelope.partition().clone();
                    let offset = envelope.offset();
                    if let Err(e) = self.strategy.submit(envelope).await {
                        tracing::error!(
                            partition = %partition,
                            offset,
                            error = %e,
                            "failed to process message"
                        );
                        return Err(e);
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.strategy.poll().await {
                        tracing::error!(error = %e, "poll failed");
                        return Err(e);
                    }
                }
            }
        }

        self.shutdown().await
    }

    async fn shutdown(mut self) -> Result<MetricsSnapshot> {
        let result = match self.strategy.close().await {
            Ok(()) => self.strategy.join(self.shutdown_timeout).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "final flush failed");
            return Err(e);
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            messages_received = snapshot.messages_received,
            messages_filtered = snapshot.messages_filtered,
            messages_skipped = snapshot.messages_skipped,
            flushes = snapshot.flushes,
            commits = snapshot.commits,
            "stream consumer stopped"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "consumer_test.rs"]
mod consumer_test;
