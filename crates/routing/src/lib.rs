//! Sluice Routing - Cluster registry
//!
//! Validated storage → cluster mapping built once at startup.
//!
//! # Design
//!
//! Storages belong to storage sets, and each storage set is hosted by
//! exactly one cluster. The `ClusterRegistry` resolves all of this when it
//! is built, so writers only ever perform map lookups.
//!
//! # Example
//!
//! ```
//! use sluice_routing::{Cluster, ClusterRegistry, StorageDefinition, StorageKey};
//!
//! let mut builder = ClusterRegistry::builder();
//! builder.register_cluster(Cluster::new("main", "ch-1").with_storage_set("events"));
//! builder.register_storage(StorageDefinition::new("errors", "events", "errors_local"));
//!
//! let registry = builder.build().unwrap();
//! let def = registry.storage(&StorageKey::new("errors")).unwrap();
//! assert_eq!(def.table, "errors_local");
//! ```

mod cluster;
mod cluster_id;
mod error;
mod registry;


pub use cluster::{Cluster, StorageDefinition, StorageSetKey};
pub use cluster_id::ClusterId;
pub use error::{Result, RoutingError};
pub use registry::{ClusterRegistry, ClusterRegistryBuilder};

// Re-export StorageKey for convenience
pub use sluice_protocol::StorageKey;
