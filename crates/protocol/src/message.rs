//! Processed message types
//!
//! A message processor maps one decoded payload to at most one
//! `ProcessedMessage`: either rows to insert into storages, or a batch of
//! replacement instructions to replay through the outbound topic.

use bytes::Bytes;
use thiserror::Error;

use crate::envelope::MessageMetadata;
use crate::StorageKey;

/// Rows produced by one processor invocation
///
/// Each row carries the storage it belongs to; one event may fan out to
/// several storages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertBatch {
    /// `(storage, row)` pairs in processor order
    pub rows: Vec<(StorageKey, serde_json::Value)>,
}

impl InsertBatch {
    /// Create an insert batch
    pub fn new(rows: Vec<(StorageKey, serde_json::Value)>) -> Self {
        Self { rows }
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch has no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Delete/merge/unmerge instructions replayed through the outbound topic
///
/// All values share `key`, which the outbound transport uses to keep
/// per-entity ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplacementBatch {
    /// Routing key (typically the project id)
    pub key: String,
    /// Replacement records in order
    pub values: Vec<serde_json::Value>,
}

impl ReplacementBatch {
    /// Create a replacement batch
    pub fn new(key: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

/// Output of a message processor
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedMessage {
    /// Rows to bulk write
    Insert(InsertBatch),
    /// Instructions to emit to the replacements topic
    Replacement(ReplacementBatch),
}

/// Insert rows already serialized to the storage wire format
///
/// Rows are encoded as single-line JSON objects (`JSONEachRow`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedInsertBatch {
    /// `(storage, encoded row)` pairs in processor order
    pub rows: Vec<(StorageKey, Bytes)>,
}

impl EncodedInsertBatch {
    /// Encode every row of an insert batch
    pub fn encode(batch: InsertBatch) -> Result<Self, serde_json::Error> {
        let rows = batch
            .rows
            .into_iter()
            .map(|(key, row)| Ok((key, encode_row(&row)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        Ok(Self { rows })
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch has no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Message after the transform step, as seen by collect and the batch sink
#[derive(Debug, Clone, PartialEq)]
pub enum TransformedMessage {
    /// Encoded insert rows
    Insert(EncodedInsertBatch),
    /// Replacement instructions, untouched
    Replacement(ReplacementBatch),
}

impl TransformedMessage {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Replacement(_) => "replacement",
        }
    }
}

/// Encode a JSON value as one wire-format row
#[inline]
pub fn encode_row(row: &serde_json::Value) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(row).map(Bytes::from)
}

/// Error returned by a message processor
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProcessorError(pub String);

impl ProcessorError {
    /// Create a processor error
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Pluggable per-deployment message processor
///
/// Pure mapping from a decoded payload and its source coordinates to at
/// most one processed message. Schema validation lives here, not in the
/// pipeline.
pub trait MessageProcessor: Send + Sync {
    /// Process one decoded message
    fn process(
        &self,
        value: serde_json::Value,
        metadata: &MessageMetadata,
    ) -> Result<Option<ProcessedMessage>, ProcessorError>;
}

impl<F> MessageProcessor for F
where
    F: Fn(serde_json::Value, &MessageMetadata) -> Result<Option<ProcessedMessage>, ProcessorError>
        + Send
        + Sync,
{
    fn process(
        &self,
        value: serde_json::Value,
        metadata: &MessageMetadata,
    ) -> Result<Option<ProcessedMessage>, ProcessorError> {
        self(value, metadata)
    }
}
