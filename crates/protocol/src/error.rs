//! Pipeline error types
//!
//! Every failure a processing step can surface. None of them are recovered
//! inside the pipeline: they abort the current flush, skip the commit and
//! propagate to whoever drives the consumer.

use std::time::Duration;

use thiserror::Error;

use crate::StorageKey;

/// Errors raised by processing steps and batch writers
#[derive(Debug, Error)]
pub enum StepError {
    /// Malformed construction parameters or configuration
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Message processor rejected the payload (or it failed to decode)
    #[error("failed to process message at offset {offset}: {message}")]
    Processing {
        /// Offset of the poisoning message
        offset: u64,
        /// Processor error message
        message: String,
    },

    /// Destination bulk write failed
    #[error("write to '{destination}' failed: {message}")]
    Write {
        /// Destination writer name
        destination: String,
        /// Underlying error message
        message: String,
    },

    /// Outbound producer reported a delivery failure
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Join deadline exceeded before outstanding work completed
    #[error("timed out after {0:?} waiting for outstanding work")]
    Timeout(Duration),

    /// Operation called in a lifecycle state that forbids it
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Payload kind the step was not configured to handle
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Row routed to a storage with no writer
    #[error("no writer configured for storage '{0}'")]
    UnknownStorage(StorageKey),

    /// Commit callback failed
    #[error("commit failed: {0}")]
    Commit(String),
}

impl StepError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a processing error
    pub fn processing(offset: u64, msg: impl Into<String>) -> Self {
        Self::Processing {
            offset,
            message: msg.into(),
        }
    }

    /// Create a write error
    pub fn write(destination: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Write {
            destination: destination.into(),
            message: msg.into(),
        }
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Create a commit error
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::Commit(msg.into())
    }

    /// Whether this error came from a downstream system rather than input
    /// data or configuration
    pub fn is_downstream(&self) -> bool {
        matches!(
            self,
            Self::Write { .. } | Self::Delivery(_) | Self::Timeout(_) | Self::Commit(_)
        )
    }
}
