//! In-memory destinations
//!
//! `MemoryWriter` keeps every bulk write and `MemoryProducer` keeps every
//! produced message. Both can be told to fail, which makes them the
//! destinations of choice for dry runs and for exercising the pipeline
//! without external services.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sluice_protocol::{Result, StepError, Topic};

use crate::producer::{DeliveryFuture, DeliveryReport, Producer};
use crate::{BatchWriter, SinkError};

/// Writer that records every bulk write
#[derive(Debug, Default)]
pub struct MemoryWriter {
    name: String,
    writes: Mutex<Vec<Vec<Bytes>>>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryWriter {
    /// Create a recording writer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Make every following write fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_with.lock() = Some(message.into());
    }

    /// Let writes succeed again
    pub fn recover(&self) {
        *self.fail_with.lock() = None;
    }

    /// Successful writes so far, one entry per bulk call
    pub fn writes(&self) -> Vec<Vec<Bytes>> {
        self.writes.lock().clone()
    }

    /// All rows written, flattened in write order
    pub fn rows(&self) -> Vec<Bytes> {
        self.writes.lock().iter().flatten().cloned().collect()
    }

    /// Number of successful bulk calls
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

#[async_trait]
impl BatchWriter for MemoryWriter {
    async fn write(&self, rows: Vec<Bytes>) -> std::result::Result<(), SinkError> {
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(SinkError::write(message));
        }
        self.writes.lock().push(rows);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// How `MemoryProducer` acknowledges messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Acknowledge immediately
    #[default]
    Immediate,
    /// Reject every message with the given reason
    Fail(String),
    /// Hold acknowledgements until `release` is called
    Held,
}

/// A message captured by `MemoryProducer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedMessage {
    pub topic: Topic,
    pub key: Bytes,
    pub value: Bytes,
}

/// Producer that records every message
#[derive(Debug, Default)]
pub struct MemoryProducer {
    mode: Mutex<DeliveryMode>,
    messages: Mutex<Vec<ProducedMessage>>,
    held: Mutex<Vec<DeliveryReport>>,
    reject_produce: AtomicBool,
    flushes: AtomicU64,
}

impl MemoryProducer {
    /// Create a producer that acknowledges immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a producer with the given delivery mode
    pub fn with_mode(mode: DeliveryMode) -> Arc<Self> {
        let producer = Self::default();
        *producer.mode.lock() = mode;
        Arc::new(producer)
    }

    /// Refuse to enqueue further messages
    pub fn reject_produce(&self, reject: bool) {
        self.reject_produce.store(reject, Ordering::Relaxed);
    }

    /// Acknowledge every held message
    pub fn release(&self) {
        for report in self.held.lock().drain(..) {
            report.delivered();
        }
    }

    /// Messages produced so far
    pub fn messages(&self) -> Vec<ProducedMessage> {
        self.messages.lock().clone()
    }

    /// Number of `flush` calls
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Producer for MemoryProducer {
    fn produce(&self, topic: &Topic, key: Bytes, value: Bytes) -> Result<DeliveryFuture> {
        if self.reject_produce.load(Ordering::Relaxed) {
            return Err(StepError::delivery(format!("queue full for topic {topic}")));
        }

        self.messages.lock().push(ProducedMessage {
            topic: topic.clone(),
            key,
            value,
        });

        let future = match &*self.mode.lock() {
            DeliveryMode::Immediate => DeliveryFuture::ready(Ok(())),
            DeliveryMode::Fail(reason) => {
                DeliveryFuture::ready(Err(StepError::delivery(reason.clone())))
            }
            DeliveryMode::Held => {
                let (report, future) = DeliveryFuture::channel();
                self.held.lock().push(report);
                future
            }
        };
        Ok(future)
    }

    async fn flush(&self, _timeout: Option<Duration>) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
