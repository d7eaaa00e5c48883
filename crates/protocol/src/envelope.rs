//! Envelope and source coordinates
//!
//! An `Envelope` wraps a payload with its position in the source log. The
//! position is assigned by the source adapter and is only ever carried
//! forward: stages may substitute the payload, never the coordinates.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Topic name in the source log or the outbound replacements stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    /// Create a new topic
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Topic name
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A single partition of a topic
///
/// Ordering within a partition is the only ordering the source log
/// guarantees, and commits are tracked per partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    topic: Topic,
    index: u16,
}

impl Partition {
    /// Create a new partition
    #[inline]
    pub fn new(topic: Topic, index: u16) -> Self {
        Self { topic, index }
    }

    /// Topic this partition belongs to
    #[inline]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Partition index within the topic
    #[inline]
    pub fn index(&self) -> u16 {
        self.index
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.index)
    }
}

/// Raw message as delivered by the source adapter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogPayload {
    /// Message key (if any)
    pub key: Option<Bytes>,
    /// Message value (JSON document for analytics events)
    pub value: Bytes,
    /// Message headers in delivery order
    pub headers: Vec<(String, Bytes)>,
}

impl LogPayload {
    /// Create a payload with only a value
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            value: value.into(),
            headers: Vec::new(),
        }
    }

    /// Attach a key
    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with the given name
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value)
    }
}

/// Payload plus its coordinates in the source log
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    partition: Partition,
    offset: u64,
    timestamp: DateTime<Utc>,
    payload: T,
}

impl<T> Envelope<T> {
    /// Create a new envelope
    #[inline]
    pub fn new(partition: Partition, offset: u64, timestamp: DateTime<Utc>, payload: T) -> Self {
        Self {
            partition,
            offset,
            timestamp,
            payload,
        }
    }

    /// Source partition
    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Offset within the source partition
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Offset of the message following this one
    #[inline]
    pub fn next_offset(&self) -> u64 {
        self.offset + 1
    }

    /// Timestamp assigned by the source log
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Borrow the payload
    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Consume the envelope, returning the payload
    #[inline]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Metadata handed to message processors
    pub fn metadata(&self) -> MessageMetadata {
        MessageMetadata {
            partition: self.partition.index,
            offset: self.offset,
            timestamp: self.timestamp,
        }
    }

    /// Same coordinates, different payload
    pub fn replace_payload<U>(&self, payload: U) -> Envelope<U> {
        Envelope {
            partition: self.partition.clone(),
            offset: self.offset,
            timestamp: self.timestamp,
            payload,
        }
    }

    /// Same coordinates, payload mapped through `f`
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            partition: self.partition,
            offset: self.offset,
            timestamp: self.timestamp,
            payload: f(self.payload),
        }
    }
}

/// Source coordinates passed to message processors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageMetadata {
    /// Partition index
    pub partition: u16,
    /// Offset within the partition
    pub offset: u64,
    /// Timestamp assigned by the source log
    pub timestamp: DateTime<Utc>,
}

/// Highest offset observed per partition in a committed window
///
/// The value is the offset of the last message written, not the next
/// offset to consume; see [`Envelope::next_offset`].
pub type Offsets = BTreeMap<Partition, u64>;
