//! Sluice - Pipeline
//!
//! Turns a stream of raw log messages into batched, durably acknowledged
//! writes, committing offsets only after the writes they cover succeeded.
//!
//! # Architecture
//!
//! ```text
//! mpsc::Receiver<Envelope<LogPayload>>
//!        │
//!        v
//! StreamConsumer ──> [FilterStep] ──> TransformStep ──> CollectStep ──> batch sink
//!                      pre-filter      decode +          window by      per-storage
//!                                      processor         size / time    writers
//!                                                            │
//!                                                            └──> commit(offsets)
//! ```
//!
//! # Key Design
//!
//! - **Write before commit**: a window's offsets are committed only after
//!   its sink closed and joined without error
//! - **Fresh sink per window**: windows never share buffered state
//! - **Fatal errors**: any failure stops the consumer; replay from the last
//!   commit gives at-least-once delivery
//!
//! # Example
//!
//! ```ignore
//! let factory = StreamingStrategyFactory::new(processor, writers, 1000, Duration::from_secs(2), None)?
//!     .with_prefilter(HeaderFilter::new("operation", "replication"));
//!
//! let consumer = StreamConsumer::new(&factory, move |offsets: Offsets| source.commit(offsets));
//! let snapshot = consumer.run(receiver).await?;
//! ```

mod collect;
mod consumer;
mod factory;
mod filter;
mod metrics;
mod transform;

pub use collect::{CollectConfig, CollectStep, Commit, SinkFactory};
pub use consumer::{DEFAULT_POLL_INTERVAL, StreamConsumer};
pub use factory::StreamingStrategyFactory;
pub use filter::{FilterStep, HeaderFilter, MessageFilter};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use transform::{ProcessMessage, TransformStep};

// Re-export key types from dependencies for convenience
pub use sluice_protocol::{Envelope, LogPayload, Offsets, ProcessingStep, Result, StepError};
pub use sluice_sinks::{BatchWriter, Producer, ReplacementTarget};

#[cfg(test)]
mod testing;
