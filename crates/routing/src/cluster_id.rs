//! Cluster identifier type
//!
//! `ClusterId` is a lightweight, Copy index into the registry's cluster list.

use std::fmt;

/// Cluster identifier
///
/// Assigned sequentially as clusters are registered. Lookups from a
/// storage set to its cluster resolve to a `ClusterId`, which indexes the
/// registry's cluster vector directly.
///
/// # Example
///
/// ```
/// use sluice_routing::ClusterId;
///
/// let cluster = ClusterId::new(0);
/// let copy = cluster;
/// assert_eq!(cluster, copy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u16);

impl ClusterId {
    /// Maximum number of clusters supported
    pub const MAX: u16 = u16::MAX;

    /// Create a new cluster ID from a numeric index
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Get the numeric index of this cluster
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    /// Get the index as usize (for vector indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster:{}", self.0)
    }
}

impl From<u16> for ClusterId {
    #[inline]
    fn from(index: u16) -> Self {
        Self::new(index)
    }
}
