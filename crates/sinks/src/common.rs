//! Common types and utilities for writers
//!
//! Shared error type and metrics for every destination and writer.

use std::sync::atomic::{AtomicU64, Ordering};

use sluice_protocol::StepError;
use thiserror::Error;

/// Metrics shared by all writers
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Bulk writes issued to a destination
    pub batches_written: AtomicU64,

    /// Rows written (sum over all bulk writes)
    pub rows_written: AtomicU64,

    /// Encoded bytes written
    pub bytes_written: AtomicU64,

    /// Bulk writes that failed
    pub write_errors: AtomicU64,

    /// Transient failures that were retried
    pub retries: AtomicU64,

    /// Replacement messages handed to the producer
    pub replacements_produced: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_written: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            replacements_produced: AtomicU64::new(0),
        }
    }

    /// Record a successful bulk write
    #[inline]
    pub fn batch_written(&self, rows: u64, bytes: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed bulk write
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a retried attempt
    #[inline]
    pub fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record produced replacement messages
    #[inline]
    pub fn replacements_produced(&self, count: u64) {
        self.replacements_produced
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_written: self.batches_written.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            replacements_produced: self.replacements_produced.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of writer metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_written: u64,
    pub rows_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub retries: u64,
    pub replacements_produced: u64,
}

/// Destination errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writer initialization failed
    #[error("failed to initialize writer: {0}")]
    Init(String),

    /// Bulk write failed
    #[error("write failed: {0}")]
    Write(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport error
    #[error("connection error: {0}")]
    Connection(String),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Convert into the pipeline error for a named destination
    pub fn into_step_error(self, destination: &str) -> StepError {
        match self {
            Self::Config(msg) | Self::Init(msg) => {
                StepError::validation(format!("{destination}: {msg}"))
            }
            other => StepError::write(destination, other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
