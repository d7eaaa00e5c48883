//! Pipeline metrics
//!
//! Atomic counters for the consumer and its stages.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics shared by every stage of one pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Envelopes handed to the strategy
    messages_received: AtomicU64,

    /// Envelopes dropped by the pre-filter
    messages_filtered: AtomicU64,

    /// Envelopes the processor mapped to nothing
    messages_skipped: AtomicU64,

    /// Insert batches produced by the processor
    inserts_processed: AtomicU64,

    /// Replacement batches produced by the processor
    replacements_processed: AtomicU64,

    /// Windows flushed
    flushes: AtomicU64,

    /// Envelopes flushed (sum of window sizes)
    messages_flushed: AtomicU64,

    /// Commit callbacks invoked
    commits: AtomicU64,

    /// Total time spent in close + join of flushed windows
    flush_duration_ns: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_filtered: AtomicU64::new(0),
            messages_skipped: AtomicU64::new(0),
            inserts_processed: AtomicU64::new(0),
            replacements_processed: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            messages_flushed: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            flush_duration_ns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.messages_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skipped(&self) {
        self.messages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_insert(&self) {
        self.inserts_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_replacement(&self) {
        self.replacements_processed
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flushed window of `size` envelopes
    #[inline]
    pub fn record_flush(&self, size: u64, duration: Duration) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.messages_flushed.fetch_add(size, Ordering::Relaxed);
        self.flush_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_filtered: self.messages_filtered.load(Ordering::Relaxed),
            messages_skipped: self.messages_skipped.load(Ordering::Relaxed),
            inserts_processed: self.inserts_processed.load(Ordering::Relaxed),
            replacements_processed: self.replacements_processed.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            messages_flushed: self.messages_flushed.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            flush_duration_ns: self.flush_duration_ns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_filtered: u64,
    pub messages_skipped: u64,
    pub inserts_processed: u64,
    pub replacements_processed: u64,
    pub flushes: u64,
    pub messages_flushed: u64,
    pub commits: u64,
    pub flush_duration_ns: u64,
}

impl MetricsSnapshot {
    /// Average envelopes per flushed window
    ///
    /// Returns None if nothing has been flushed.
    #[inline]
    pub fn avg_window_size(&self) -> Option<f64> {
        (self.flushes > 0).then(|| self.messages_flushed as f64 / self.flushes as f64)
    }

    /// Average flush duration
    #[inline]
    pub fn avg_flush_duration(&self) -> Option<Duration> {
        (self.flushes > 0).then(|| Duration::from_nanos(self.flush_duration_ns / self.flushes))
    }
}
