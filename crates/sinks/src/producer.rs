//! Outbound producer capability
//!
//! Replacement instructions are replayed through an outbound topic. The
//! producer hands back a `DeliveryFuture` per message; the future resolves
//! once the broker acknowledged (or rejected) the message.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sluice_protocol::{Result, StepError, Topic};
use tokio::sync::oneshot;

/// Outbound message producer
#[async_trait]
pub trait Producer: Send + Sync {
    /// Enqueue one keyed message for delivery
    ///
    /// # Errors
    ///
    /// Fails with `StepError::Delivery` if the message cannot be enqueued.
    fn produce(&self, topic: &Topic, key: Bytes, value: Bytes) -> Result<DeliveryFuture>;

    /// Push out everything enqueued so far, waiting at most `timeout`
    async fn flush(&self, timeout: Option<Duration>) -> Result<()>;
}

/// Resolves exactly once with the delivery outcome of one message
pub struct DeliveryFuture {
    inner: Pin<Box<dyn Future<Output = Result<()>> + Send>>,
}

impl DeliveryFuture {
    /// Wrap an arbitrary delivery future
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            inner: Box::pin(fut),
        }
    }

    /// Already resolved delivery
    pub fn ready(result: Result<()>) -> Self {
        Self::new(std::future::ready(result))
    }

    /// Create a report/future pair for producers with callback-style acks
    pub fn channel() -> (DeliveryReport, Self) {
        let (tx, rx) = oneshot::channel();
        let fut = Self::new(async move {
            match rx.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(message)) => Err(StepError::delivery(message)),
                Err(_) => Err(StepError::delivery("delivery report dropped")),
            }
        });
        (DeliveryReport { tx }, fut)
    }
}

impl Future for DeliveryFuture {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for DeliveryFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryFuture").finish_non_exhaustive()
    }
}

/// Sending half of `DeliveryFuture::channel`
///
/// Dropping it without reporting fails the delivery.
#[derive(Debug)]
pub struct DeliveryReport {
    tx: oneshot::Sender<std::result::Result<(), String>>,
}

impl DeliveryReport {
    /// Report successful delivery
    pub fn delivered(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Report a delivery failure
    pub fn failed(self, message: impl Into<String>) {
        let _ = self.tx.send(Err(message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_delivered() {
        let (report, future) = DeliveryFuture::channel();
        report.delivered();
        future.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_failed() {
        let (report, future) = DeliveryFuture::channel();
        report.failed("message too large");
        let err = future.await.unwrap_err();
        assert!(matches!(err, StepError::Delivery(ref m) if m == "message too large"));
    }

    #[tokio::test]
    async fn test_dropped_report_fails_delivery() {
        let (report, future) = DeliveryFuture::channel();
        drop(report);
        assert!(future.await.is_err());
    }

    #[tokio::test]
    async fn test_ready() {
        DeliveryFuture::ready(Ok(())).await.unwrap();
        assert!(DeliveryFuture::ready(Err(StepError::delivery("x"))).await.is_err());
    }
}
