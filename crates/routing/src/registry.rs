//! Cluster registry for O(1) storage → cluster lookup
//!
//! The registry is built once at startup and never mutated. Building it
//! validates the whole mapping: every storage set in use is hosted by
//! exactly one cluster, and every storage resolves to a cluster.

use std::collections::{BTreeSet, HashMap};

use sluice_protocol::StorageKey;

use crate::cluster::{Cluster, StorageDefinition, StorageSetKey};
use crate::error::{Result, RoutingError};
use crate::ClusterId;

/// Immutable, validated storage → cluster mapping
///
/// # Example
///
/// ```
/// use sluice_routing::{Cluster, ClusterRegistry, StorageDefinition};
/// use sluice_protocol::StorageKey;
///
/// let mut builder = ClusterRegistry::builder();
/// builder.register_cluster(Cluster::new("main", "localhost").with_storage_set("events"));
/// builder.register_storage(StorageDefinition::new("errors", "events", "errors_local"));
/// let registry = builder.build().unwrap();
///
/// let cluster = registry.cluster_for(&StorageKey::new("errors")).unwrap();
/// assert_eq!(cluster.name, "main");
/// ```
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    /// Clusters indexed by ClusterId
    clusters: Vec<Cluster>,

    /// Storage set → hosting cluster
    storage_sets: HashMap<StorageSetKey, ClusterId>,

    /// Storage → (definition, hosting cluster)
    storages: HashMap<StorageKey, (StorageDefinition, ClusterId)>,
}

impl ClusterRegistry {
    /// Start building a registry
    #[inline]
    #[must_use]
    pub fn builder() -> ClusterRegistryBuilder {
        ClusterRegistryBuilder::new()
    }

    /// Cluster hosting a storage
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::UnknownStorage` if the storage is not registered.
    pub fn cluster_for(&self, storage: &StorageKey) -> Result<&Cluster> {
        self.storages
            .get(storage)
            .map(|(_, id)| &self.clusters[id.as_usize()])
            .ok_or_else(|| RoutingError::unknown_storage(storage.as_str()))
    }

    /// Cluster hosting a storage set
    #[inline]
    pub fn cluster_for_storage_set(&self, storage_set: &StorageSetKey) -> Option<&Cluster> {
        self.storage_sets
            .get(storage_set)
            .map(|id| &self.clusters[id.as_usize()])
    }

    /// Definition of a storage
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::UnknownStorage` if the storage is not registered.
    pub fn storage(&self, storage: &StorageKey) -> Result<&StorageDefinition> {
        self.storages
            .get(storage)
            .map(|(def, _)| def)
            .ok_or_else(|| RoutingError::unknown_storage(storage.as_str()))
    }

    /// Cluster by ID
    #[inline]
    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.as_usize())
    }

    /// All clusters in registration order
    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Iterate over all storages with their hosting cluster
    pub fn storages(&self) -> impl Iterator<Item = (&StorageDefinition, &Cluster)> {
        self.storages
            .values()
            .map(|(def, id)| (def, &self.clusters[id.as_usize()]))
    }

    /// Number of registered storages
    #[inline]
    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }

    /// Number of registered clusters
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

/// Builder for the cluster registry
#[derive(Debug, Default)]
pub struct ClusterRegistryBuilder {
    clusters: Vec<Cluster>,
    storages: Vec<StorageDefinition>,
    required_storage_sets: BTreeSet<StorageSetKey>,
}

impl ClusterRegistryBuilder {
    /// Create a new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster and get its ID
    pub fn register_cluster(&mut self, cluster: Cluster) -> ClusterId {
        let id = ClusterId::new(self.clusters.len() as u16);
        self.clusters.push(cluster);
        id
    }

    /// Register a writable storage
    pub fn register_storage(&mut self, storage: StorageDefinition) -> &mut Self {
        self.storages.push(storage);
        self
    }

    /// Require a storage set to be hosted even if no storage uses it yet
    pub fn require_storage_set(&mut self, storage_set: impl Into<StorageSetKey>) -> &mut Self {
        self.required_storage_sets.insert(storage_set.into());
        self
    }

    /// Validate and build the registry
    ///
    /// # Errors
    ///
    /// - `NoClusters` if nothing was registered
    /// - `DuplicateCluster` if two clusters share a name
    /// - `StorageSetConflict` if a storage set is hosted twice
    /// - `DuplicateStorage` if a storage key is registered twice
    /// - `UnassignedStorageSet` if a storage set in use has no cluster
    pub fn build(self) -> Result<ClusterRegistry> {
        if self.clusters.is_empty() {
            return Err(RoutingError::NoClusters);
        }

        let mut names = BTreeSet::new();
        let mut storage_sets: HashMap<StorageSetKey, ClusterId> = HashMap::new();

        for (index, cluster) in self.clusters.iter().enumerate() {
            if !names.insert(cluster.name.as_str()) {
                return Err(RoutingError::duplicate_cluster(&cluster.name));
            }

            let id = ClusterId::new(index as u16);
            for set in &cluster.storage_sets {
                if let Some(existing) = storage_sets.insert(set.clone(), id) {
                    return Err(RoutingError::storage_set_conflict(
                        set.as_str(),
                        &self.clusters[existing.as_usize()].name,
                        &cluster.name,
                    ));
                }
            }
        }

        for set in &self.required_storage_sets {
            if !storage_sets.contains_key(set) {
                return Err(RoutingError::unassigned_storage_set(set.as_str()));
            }
        }

        let mut storages = HashMap::with_capacity(self.storages.len());
        for storage in self.storages {
            let Some(&cluster) = storage_sets.get(&storage.storage_set) else {
                return Err(RoutingError::unassigned_storage_set(
                    storage.storage_set.as_str(),
                ));
            };

            if storages.contains_key(&storage.key) {
                return Err(RoutingError::duplicate_storage(storage.key.as_str()));
            }
            storages.insert(storage.key.clone(), (storage, cluster));
        }

        tracing::debug!(
            clusters = self.clusters.len(),
            storage_sets = storage_sets.len(),
            storages = storages.len(),
            "cluster registry built"
        );

        Ok(ClusterRegistry {
            clusters: self.clusters,
            storage_sets,
            storages,
        })
    }
}
