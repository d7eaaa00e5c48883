//! Cluster and storage definitions

use std::collections::BTreeSet;
use std::fmt;

use sluice_protocol::StorageKey;

/// Group of storages that must live on the same cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageSetKey(String);

impl StorageSetKey {
    /// Create a new storage set key
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageSetKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A ClickHouse cluster and the storage sets it hosts
#[derive(Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Unique cluster name
    pub name: String,
    /// Host name
    pub host: String,
    /// Native protocol port
    pub port: u16,
    /// HTTP interface port
    pub http_port: u16,
    /// User name
    pub user: String,
    /// Password (may be empty)
    pub password: String,
    /// Default database
    pub database: String,
    /// Use HTTPS for the HTTP interface
    pub secure: bool,
    /// Storage sets hosted here
    pub storage_sets: BTreeSet<StorageSetKey>,
}

impl Cluster {
    /// Create a cluster with default ports and credentials
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: 9000,
            http_port: 8123,
            user: "default".into(),
            password: String::new(),
            database: "default".into(),
            secure: false,
            storage_sets: BTreeSet::new(),
        }
    }

    /// Set the native and HTTP ports
    pub fn with_ports(mut self, port: u16, http_port: u16) -> Self {
        self.port = port;
        self.http_port = http_port;
        self
    }

    /// Set credentials
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Set the default database
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Use HTTPS
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Host a storage set on this cluster
    pub fn with_storage_set(mut self, storage_set: impl Into<StorageSetKey>) -> Self {
        self.storage_sets.insert(storage_set.into());
        self
    }

    /// Base URL of the HTTP interface
    pub fn http_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.http_port)
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("http_port", &self.http_port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("secure", &self.secure)
            .field("storage_sets", &self.storage_sets)
            .finish()
    }
}

/// A writable storage: which storage set it belongs to and its table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDefinition {
    /// Storage key rows are tagged with
    pub key: StorageKey,
    /// Storage set the storage belongs to
    pub storage_set: StorageSetKey,
    /// Table rows are inserted into
    pub table: String,
}

impl StorageDefinition {
    /// Create a storage definition
    pub fn new(
        key: impl Into<StorageKey>,
        storage_set: impl Into<StorageSetKey>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            storage_set: storage_set.into(),
            table: table.into(),
        }
    }
}
