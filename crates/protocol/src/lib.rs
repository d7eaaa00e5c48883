//! Sluice Protocol - Core types for the ingestion pipeline
//!
//! This crate provides the foundational types that flow through the pipeline:
//! - `Envelope` - Payload plus its (partition, offset, timestamp) coordinates
//! - `LogPayload` - Raw message as delivered by the source log
//! - `ProcessedMessage` - Insert rows or replacement instructions
//! - `TransformedMessage` - Same, with insert rows encoded for storage
//! - `ProcessingStep` - Lifecycle shared by every stage and writer
//! - `StepError` - The pipeline error taxonomy
//!
//! # Design Principles
//!
//! - **Coordinates are immutable**: stages substitute payloads, never offsets
//! - **Exhaustive dispatch**: processed output is an enum, matched everywhere
//! - **Zero-copy rows**: encoded rows are `bytes::Bytes`, cheap to regroup

mod envelope;
mod error;
mod message;
mod step;
mod storage;

pub use envelope::{Envelope, LogPayload, MessageMetadata, Offsets, Partition, Topic};
pub use error::StepError;
pub use message::{
    EncodedInsertBatch, InsertBatch, MessageProcessor, ProcessedMessage, ProcessorError,
    ReplacementBatch, TransformedMessage, encode_row,
};
pub use step::{Deadline, ProcessingStep};
pub use storage::StorageKey;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, StepError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod envelope_test;
#[cfg(test)]
mod storage_test;
