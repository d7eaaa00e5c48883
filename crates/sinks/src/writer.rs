//! Destination writer capability

use async_trait::async_trait;
use bytes::Bytes;

use crate::SinkError;

/// Bulk writer for one destination
///
/// Receives fully encoded rows and writes them in a single operation.
/// Writers are built once and shared across batch windows.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// Write all rows in one bulk operation
    async fn write(&self, rows: Vec<Bytes>) -> Result<(), SinkError>;

    /// Destination name used in logs and errors
    fn name(&self) -> &str;
}
