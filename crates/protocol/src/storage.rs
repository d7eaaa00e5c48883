//! Storage identification types
//!
//! `StorageKey` names the logical storage a row is written to. The cluster
//! registry resolves it to a physical table on one cluster.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical storage (destination) identifier
///
/// A single input event may fan out rows to several storages, so every
/// encoded row carries the key of the storage it belongs to.
///
/// # Example
///
/// ```
/// use sluice_protocol::StorageKey;
///
/// let key = StorageKey::new("errors");
/// assert_eq!(key.as_str(), "errors");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Create a new storage key
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the storage key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StorageKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StorageKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
