//! ClickHouse destination
//!
//! Bulk inserts of pre-encoded `JSONEachRow` rows over the HTTP interface,
//! with bounded retries and exponential backoff on transport and server
//! errors. Client errors (4xx) are not retried.
//!
//! One writer is built per storage, pointed at the cluster hosting that
//! storage's storage set.

mod config;
mod writer;

use std::collections::BTreeMap;
use std::sync::Arc;

use sluice_routing::{ClusterRegistry, StorageKey};

pub use config::{
    ClickHouseConfig, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_INSERT_SETTINGS, DEFAULT_RETRY_ATTEMPTS,
};
pub use writer::ClickHouseWriter;

use crate::{BatchWriter, SinkError};

/// Build one writer per registered storage
///
/// `customize` can adjust each storage's config (timeouts, settings)
/// before its writer is created.
pub fn writers_from_registry<F>(
    registry: &ClusterRegistry,
    customize: F,
) -> Result<BTreeMap<StorageKey, Arc<dyn BatchWriter>>, SinkError>
where
    F: Fn(ClickHouseConfig) -> ClickHouseConfig,
{
    let mut writers: BTreeMap<StorageKey, Arc<dyn BatchWriter>> = BTreeMap::new();
    for (storage, cluster) in registry.storages() {
        let config = customize(ClickHouseConfig::for_storage(cluster, storage));
        tracing::debug!(
            storage = %storage.key,
            cluster = %cluster.name,
            table = %storage.table,
            "ClickHouse writer configured"
        );
        let writer = ClickHouseWriter::new(storage.key.as_str(), config)?;
        writers.insert(storage.key.clone(), Arc::new(writer));
    }
    Ok(writers)
}
