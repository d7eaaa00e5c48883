//! Sluice - Sinks
//!
//! Everything downstream of the collect stage: the per-window batch sink,
//! its insert and replacement writers, and the long-lived destinations
//! they write to.
//!
//! # Architecture
//!
//! ```text
//! CollectStep ──> ProcessedMessageBatchWriter (one per window)
//!                   ├─> InsertBatchWriter per storage ──> Arc<dyn BatchWriter>
//!                   └─> ReplacementBatchWriter ──────────> Arc<dyn Producer>
//! ```
//!
//! Writers buffer until `close()`; the bulk write (or produce) happens
//! there, and `join()` waits for acknowledgements. Inserts are always
//! closed before replacements.
//!
//! # Destinations
//!
//! | Destination | Purpose |
//! |-------------|---------|
//! | `clickhouse` | HTTP `JSONEachRow` bulk inserts |
//! | `memory` | Recording writer/producer for dry runs and tests |

/// ClickHouse HTTP destination
pub mod clickhouse;

/// In-memory writer and producer
pub mod memory;

mod batch;
mod common;
mod insert;
mod producer;
mod replacement;
mod writer;

pub use batch::{ProcessedMessageBatchWriter, WriterSet};
pub use common::{MetricsSnapshot, SinkError, SinkMetrics};
pub use insert::InsertBatchWriter;
pub use producer::{DeliveryFuture, DeliveryReport, Producer};
pub use replacement::{ReplacementBatchWriter, ReplacementTarget};
pub use writer::BatchWriter;
