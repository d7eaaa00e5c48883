//! ClickHouse writer configuration

use std::time::Duration;

use sluice_routing::{Cluster, StorageDefinition};

/// Default retry attempts
pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Default request timeout
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings applied to every insert unless overridden
pub const DEFAULT_INSERT_SETTINGS: &[(&str, &str)] = &[
    ("load_balancing", "in_order"),
    ("insert_distributed_sync", "1"),
];

/// Configuration for one ClickHouse table writer
#[derive(Clone)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123")
    pub url: String,

    /// Database name
    pub database: String,

    /// Destination table
    pub table: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Per-insert settings sent as query parameters
    pub settings: Vec<(String, String)>,

    /// Request timeout
    pub connection_timeout: Duration,

    /// Number of attempts per insert
    pub retry_attempts: usize,

    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,

    /// Maximum retry delay
    pub retry_max_delay: Duration,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            table: String::new(),
            username: None,
            password: None,
            settings: DEFAULT_INSERT_SETTINGS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(10),
        }
    }
}

impl ClickHouseConfig {
    /// Config for writing one storage on its cluster
    pub fn for_storage(cluster: &Cluster, storage: &StorageDefinition) -> Self {
        let config = Self::default()
            .with_url(cluster.http_url())
            .with_database(&cluster.database)
            .with_table(&storage.table);

        if cluster.user.is_empty() {
            config
        } else {
            config.with_credentials(&cluster.user, &cluster.password)
        }
    }

    /// Set the ClickHouse URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the destination table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Add or replace an insert setting
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.settings.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.settings.push((key, value)),
        }
        self
    }

    /// Set the number of attempts per insert
    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Set the backoff bounds
    pub fn with_retry_delay(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    /// Insert statement for the destination table
    pub fn insert_query(&self) -> String {
        format!("INSERT INTO {} FORMAT JSONEachRow", self.table)
    }

    /// Backoff before the attempt following `attempt` (zero-based)
    pub fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(self.retry_max_delay)
    }
}

impl std::fmt::Debug for ClickHouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("table", &self.table)
            .field("username", &self.username)
            .field("settings", &self.settings)
            .field("retry_attempts", &self.retry_attempts)
            .finish_non_exhaustive()
    }
}
