//! Cluster and storage layout configuration

use std::collections::BTreeMap;

use serde::Deserialize;
use sluice_routing::{Cluster, StorageDefinition};

/// One ClickHouse cluster
///
/// Fields left out fall back to the defaults of [`Cluster::new`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Unique cluster name
    pub name: String,

    /// Host name
    #[serde(default)]
    pub host: String,

    /// Native protocol port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP interface port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// User name
    #[serde(default = "default_user")]
    pub user: String,

    /// Password
    #[serde(default)]
    pub password: String,

    /// Default database
    #[serde(default = "default_database")]
    pub database: String,

    /// Use HTTPS for inserts
    #[serde(default)]
    pub secure: bool,

    /// Storage sets hosted by this cluster
    #[serde(default)]
    pub storage_sets: Vec<String>,
}

fn default_port() -> u16 {
    9000
}

fn default_http_port() -> u16 {
    8123
}

fn default_user() -> String {
    "default".into()
}

fn default_database() -> String {
    "default".into()
}

impl ClusterConfig {
    /// Convert to a registry cluster
    pub fn to_cluster(&self) -> Cluster {
        self.storage_sets.iter().fold(
            Cluster::new(&self.name, &self.host)
                .with_ports(self.port, self.http_port)
                .with_credentials(&self.user, &self.password)
                .with_database(&self.database)
                .with_secure(self.secure),
            |cluster, set| cluster.with_storage_set(set.as_str()),
        )
    }
}

/// One writable storage
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage set the storage belongs to
    #[serde(default)]
    pub storage_set: String,

    /// Destination table
    #[serde(default)]
    pub table: String,
}

/// Storages keyed by storage key
///
/// ```toml
/// [storages.errors]
/// storage_set = "events"
/// table = "errors_local"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoragesConfig {
    #[serde(flatten)]
    storages: BTreeMap<String, StorageConfig>,
}

impl StoragesConfig {
    /// Get a storage by key
    pub fn get(&self, key: &str) -> Option<&StorageConfig> {
        self.storages.get(key)
    }

    /// Iterate over storages in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StorageConfig)> {
        self.storages.iter()
    }

    /// Number of storages
    pub fn len(&self) -> usize {
        self.storages.len()
    }

    /// Check if no storages are configured
    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// Convert to registry storage definitions
    pub fn definitions(&self) -> impl Iterator<Item = StorageDefinition> + '_ {
        self.storages.iter().map(|(key, storage)| {
            StorageDefinition::new(key.as_str(), storage.storage_set.as_str(), &storage.table)
        })
    }
}
