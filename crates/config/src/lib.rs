//! Sluice Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the cluster layout has to be spelled out; everything else can be
//! left at its default.
//!
//! # Parsing
//!
//! ```
//! use sluice_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[consumer]\nmax_batch_size = 500").unwrap();
//! assert_eq!(config.consumer.max_batch_size, 500);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [consumer]
//! max_batch_size = 1000
//! max_batch_time_ms = 2000
//!
//! [replacements]
//! enabled = true
//! topic = "event-replacements"
//!
//! [[clusters]]
//! name = "main"
//! host = "localhost"
//! storage_sets = ["events"]
//!
//! [storages.errors]
//! storage_set = "events"
//! table = "errors_local"
//! ```

mod clusters;
mod consumer;
mod error;
mod logging;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use clusters::{ClusterConfig, StorageConfig, StoragesConfig};
pub use consumer::{ConsumerConfig, ReplacementsConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};

use serde::Deserialize;
use sluice_routing::ClusterRegistry;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batching thresholds and shutdown bound
    pub consumer: ConsumerConfig,

    /// Replacement production
    pub replacements: ReplacementsConfig,

    /// ClickHouse clusters
    pub clusters: Vec<ClusterConfig>,

    /// Writable storages
    pub storages: StoragesConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Build the cluster registry from the configured layout
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Registry` if the layout is inconsistent.
    pub fn to_registry(&self) -> Result<ClusterRegistry> {
        let mut builder = ClusterRegistry::builder();
        for cluster in &self.clusters {
            builder.register_cluster(cluster.to_cluster());
        }
        for storage in self.storages.definitions() {
            builder.register_storage(storage);
        }
        Ok(builder.build()?)
    }

    /// Outbound replacements topic, if replacements are enabled
    pub fn replacements_topic(&self) -> Option<&str> {
        if self.replacements.enabled {
            self.replacements.topic.as_deref()
        } else {
            None
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use sluice_routing::StorageKey;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.consumer.max_batch_size, 1000);
        assert!(config.clusters.is_empty());
        assert!(config.replacements_topic().is_none());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[consumer]
max_batch_size = 250
max_batch_time_ms = 500
poll_interval_ms = 50
join_timeout_ms = 10000

[replacements]
enabled = true
topic = "event-replacements"

[[clusters]]
name = "main"
host = "ch-main"
port = 9440
http_port = 8443
secure = true
user = "writer"
password = "secret"
database = "sluice"
storage_sets = ["events", "transactions"]

[[clusters]]
name = "querylog"
host = "ch-ql"
storage_sets = ["querylog"]

[storages.errors]
storage_set = "events"
table = "errors_local"

[storages.transactions]
storage_set = "transactions"
table = "transactions_local"

[storages.querylog]
storage_set = "querylog"
table = "querylog_local"

[log]
level = "debug"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.consumer.max_batch_size, 250);
        assert_eq!(config.replacements_topic(), Some("event-replacements"));
        assert_eq!(config.clusters.len(), 2);
        assert_eq!(config.storages.len(), 3);
        assert_eq!(config.log.level, LogLevel::Debug);

        let registry = config.to_registry().unwrap();
        let main = registry.cluster_for(&StorageKey::new("errors")).unwrap();
        assert_eq!(main.http_url(), "https://ch-main:8443");
        assert_eq!(main.database, "sluice");
        assert_eq!(
            registry
                .cluster_for(&StorageKey::new("querylog"))
                .unwrap()
                .name,
            "querylog"
        );
    }

    #[test]
    fn test_registry_requires_clusters() {
        let config = Config::from_str("").unwrap();
        assert!(matches!(config.to_registry(), Err(ConfigError::Registry(_))));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_str("invalid { toml"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[consumer]\nmax_batch_size = 42").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.consumer.max_batch_size, 42);
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/sluice.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("/nonexistent/sluice.toml"));
    }
}
