//! Producer-side ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics, shared by every writer of one synchronizer
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Samples stored in a queue
    pub samples_received: AtomicU64,

    /// Samples lost to the overflow policy (evicted or discarded)
    pub samples_dropped: AtomicU64,

    /// Samples refused with an error
    pub samples_rejected: AtomicU64,

    /// Batches delivered by producers
    pub batches: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self, count: usize) {
        self.samples_received
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: usize) {
        self.samples_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.samples_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_received: u64,
    pub samples_dropped: u64,
    pub samples_rejected: u64,
    pub batches: u64,
}
