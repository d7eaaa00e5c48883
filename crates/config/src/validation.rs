//! Configuration validation
//!
//! Validates config consistency:
//! - Batching thresholds are non-zero
//! - Replacement production has a topic, and a topic implies production
//! - Clusters and storages carry their required fields
//! - The cluster layout forms a valid registry

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_consumer(config)?;
    validate_replacements(config)?;
    validate_clusters(config)?;
    validate_storages(config)?;

    if !config.clusters.is_empty() || !config.storages.is_empty() {
        config.to_registry()?;
    }

    Ok(())
}

fn validate_consumer(config: &Config) -> Result<()> {
    let consumer = &config.consumer;

    if consumer.max_batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "consumer",
            "consumer",
            "max_batch_size",
            "must be greater than zero",
        ));
    }
    if consumer.max_batch_time_ms == 0 {
        return Err(ConfigError::invalid_value(
            "consumer",
            "consumer",
            "max_batch_time_ms",
            "must be greater than zero",
        ));
    }
    if consumer.poll_interval_ms == 0 {
        return Err(ConfigError::invalid_value(
            "consumer",
            "consumer",
            "poll_interval_ms",
            "must be greater than zero",
        ));
    }

    Ok(())
}

fn validate_replacements(config: &Config) -> Result<()> {
    let replacements = &config.replacements;
    let topic = replacements.topic.as_deref().filter(|t| !t.is_empty());

    match (replacements.enabled, topic) {
        (true, None) => Err(ConfigError::missing_field(
            "replacements",
            "replacements",
            "topic",
        )),
        (false, Some(_)) => Err(ConfigError::invalid_value(
            "replacements",
            "replacements",
            "topic",
            "topic is set but replacements are not enabled",
        )),
        _ => Ok(()),
    }
}

fn validate_clusters(config: &Config) -> Result<()> {
    for (index, cluster) in config.clusters.iter().enumerate() {
        if cluster.name.is_empty() {
            return Err(ConfigError::missing_field(
                "cluster",
                format!("#{index}"),
                "name",
            ));
        }
        if cluster.host.is_empty() {
            return Err(ConfigError::missing_field("cluster", &cluster.name, "host"));
        }
        if cluster.http_port == 0 {
            return Err(ConfigError::invalid_value(
                "cluster",
                &cluster.name,
                "http_port",
                "must be non-zero",
            ));
        }
    }

    Ok(())
}

fn validate_storages(config: &Config) -> Result<()> {
    for (key, storage) in config.storages.iter() {
        if storage.storage_set.is_empty() {
            return Err(ConfigError::missing_field("storage", key, "storage_set"));
        }
        if storage.table.is_empty() {
            return Err(ConfigError::missing_field("storage", key, "table"));
        }
    }

    Ok(())
}
