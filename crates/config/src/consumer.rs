//! Consumer batching configuration
//!
//! Controls when the collect stage flushes and how long shutdown may take.

use std::time::Duration;

use serde::Deserialize;

/// Batching and shutdown settings for the stream consumer
///
/// # Example
///
/// ```toml
/// [consumer]
/// max_batch_size = 1000
/// max_batch_time_ms = 2000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Messages per batch before a flush is forced
    /// Default: 1000
    pub max_batch_size: usize,

    /// Age of a batch (ms) before a flush is forced
    /// Default: 2000
    pub max_batch_time_ms: u64,

    /// Interval (ms) between time-threshold checks while idle
    /// Default: 100
    pub poll_interval_ms: u64,

    /// Bound (ms) on draining outstanding work at shutdown; `0` waits forever
    /// Default: 30000
    pub join_timeout_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_batch_time_ms: 2000,
            poll_interval_ms: 100,
            join_timeout_ms: 30_000,
        }
    }
}

impl ConsumerConfig {
    /// Maximum batch age
    #[inline]
    pub fn max_batch_time(&self) -> Duration {
        Duration::from_millis(self.max_batch_time_ms)
    }

    /// Poll interval
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shutdown bound, `None` when unbounded
    #[inline]
    pub fn join_timeout(&self) -> Option<Duration> {
        (self.join_timeout_ms > 0).then(|| Duration::from_millis(self.join_timeout_ms))
    }
}

/// Replacement production settings
///
/// ```toml
/// [replacements]
/// enabled = true
/// topic = "event-replacements"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReplacementsConfig {
    /// Produce replacements to the outbound topic
    pub enabled: bool,

    /// Outbound topic for replacement messages
    pub topic: Option<String>,
}
