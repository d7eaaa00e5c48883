//! Routing error types

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur while building the cluster registry
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Two clusters share a name
    #[error("cluster '{name}' is defined more than once")]
    DuplicateCluster {
        /// Duplicated cluster name
        name: String,
    },

    /// A storage set is claimed by more than one cluster
    #[error("storage set '{storage_set}' is registered to clusters '{first}' and '{second}'")]
    StorageSetConflict {
        /// Contested storage set
        storage_set: String,
        /// Cluster that registered it first
        first: String,
        /// Cluster that registered it again
        second: String,
    },

    /// A storage set in use has no cluster
    #[error("storage set '{storage_set}' is not assigned to any cluster")]
    UnassignedStorageSet {
        /// Unassigned storage set
        storage_set: String,
    },

    /// A storage is defined twice
    #[error("storage '{storage}' is defined more than once")]
    DuplicateStorage {
        /// Duplicated storage key
        storage: String,
    },

    /// Lookup of a storage the registry does not know
    #[error("unknown storage '{storage}'")]
    UnknownStorage {
        /// Missing storage key
        storage: String,
    },

    /// No clusters configured
    #[error("no clusters are configured")]
    NoClusters,
}

impl RoutingError {
    /// Create a DuplicateCluster error
    #[inline]
    pub fn duplicate_cluster(name: impl Into<String>) -> Self {
        Self::DuplicateCluster { name: name.into() }
    }

    /// Create a StorageSetConflict error
    #[inline]
    pub fn storage_set_conflict(
        storage_set: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::StorageSetConflict {
            storage_set: storage_set.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create an UnassignedStorageSet error
    #[inline]
    pub fn unassigned_storage_set(storage_set: impl Into<String>) -> Self {
        Self::UnassignedStorageSet {
            storage_set: storage_set.into(),
        }
    }

    /// Create a DuplicateStorage error
    #[inline]
    pub fn duplicate_storage(storage: impl Into<String>) -> Self {
        Self::DuplicateStorage {
            storage: storage.into(),
        }
    }

    /// Create an UnknownStorage error
    #[inline]
    pub fn unknown_storage(storage: impl Into<String>) -> Self {
        Self::UnknownStorage {
            storage: storage.into(),
        }
    }
}
