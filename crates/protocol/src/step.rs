//! Processing step lifecycle
//!
//! Every stage of the pipeline (filter, transform, collect) and every
//! writer behind the collect stage implements the same capability set.
//! Stages compose by owning the next step.
//!
//! ```text
//! poll()        time-based housekeeping, no new input
//! submit(env)   hand one envelope to the step
//! close()       no more submits; start flushing buffered work
//! join(t)       wait (at most t) for flushed work to be acknowledged
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{Envelope, Result, StepError};

/// A stage in the processing chain
#[async_trait]
pub trait ProcessingStep<T: Send + 'static>: Send {
    /// Run time-based housekeeping without submitting anything
    async fn poll(&mut self) -> Result<()>;

    /// Submit an envelope to this step
    ///
    /// # Errors
    ///
    /// Fails with `StepError::InvalidState` once the step is closed.
    async fn submit(&mut self, envelope: Envelope<T>) -> Result<()>;

    /// Stop accepting envelopes and start flushing buffered work
    async fn close(&mut self) -> Result<()>;

    /// Wait for all flushed work to complete
    ///
    /// `None` waits indefinitely. Running out of time is a failure, never
    /// a partial success.
    async fn join(&mut self, timeout: Option<Duration>) -> Result<()>;
}

#[async_trait]
impl<T: Send + 'static> ProcessingStep<T> for Box<dyn ProcessingStep<T>> {
    async fn poll(&mut self) -> Result<()> {
        (**self).poll().await
    }

    async fn submit(&mut self, envelope: Envelope<T>) -> Result<()> {
        (**self).submit(envelope).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }

    async fn join(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).join(timeout).await
    }
}

/// Remaining time budget for a join spanning several children
///
/// Created once at the start of a join; each child is given whatever is
/// left, so a slow first child cannot starve later ones silently.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    timeout: Option<Duration>,
    started: Instant,
}

impl Deadline {
    /// Start a deadline now; `None` never expires
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            started: Instant::now(),
        }
    }

    /// Total budget this deadline was created with
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Time left, saturating at zero; `None` for an unbounded deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.timeout
            .map(|t| t.saturating_sub(self.started.elapsed()))
    }

    /// Whether a bounded deadline has run out
    pub fn expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// Await `fut`, failing with `StepError::Timeout` once the deadline passes
    pub async fn run<F, O>(&self, fut: F) -> Result<O>
    where
        F: std::future::Future<Output = O>,
    {
        match self.timeout {
            None => Ok(fut.await),
            Some(timeout) => tokio::time::timeout_at(self.started + timeout, fut)
                .await
                .map_err(|_| StepError::Timeout(timeout)),
        }
    }
}
