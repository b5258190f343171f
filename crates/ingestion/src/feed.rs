//! Producer feed: the only way samples enter the synchronizer's queues.

use std::sync::Arc;

use contracts::{ContractError, Sample, SampleFeed, SourceIndex};
use observability::metrics::{
    record_samples_accepted, record_samples_dropped, record_samples_rejected,
};
use sync_engine::{AppendOutcome, StreamQueue, Synchronizer};
use tracing::{trace, warn};

use crate::metrics::IngestionMetrics;

fn rejection_reason(err: &ContractError) -> &'static str {
    match err {
        ContractError::NonMonotonicTimestamp { .. } => "non_monotonic",
        ContractError::QueueFull { .. } => "queue_full",
        ContractError::SourceOutOfRange { .. } => "out_of_range",
        _ => "other",
    }
}

/// Append handle for one source
///
/// Wraps the shared queue of a single source. Cloning is cheap; all clones
/// write to the same queue and the caller is expected to keep a single
/// logical producer per source.
#[derive(Debug, Clone)]
pub struct SourceWriter {
    queue: Arc<StreamQueue>,
    metrics: Arc<IngestionMetrics>,
}

impl SourceWriter {
    pub fn new(queue: Arc<StreamQueue>, metrics: Arc<IngestionMetrics>) -> Self {
        Self { queue, metrics }
    }

    /// Source this writer appends to
    pub fn source_index(&self) -> SourceIndex {
        self.queue.index()
    }

    /// Append one sample
    ///
    /// # Errors
    /// `NonMonotonicTimestamp` or `QueueFull`, logged and counted here
    pub fn push(&self, sample: Sample) -> Result<AppendOutcome, ContractError> {
        let source = self.queue.index();
        match self.queue.append(sample) {
            Ok(outcome) => {
                match outcome {
                    AppendOutcome::Accepted => self.on_accepted(1, 0),
                    AppendOutcome::Evicted(_) => self.on_accepted(1, 1),
                    AppendOutcome::Discarded => self.on_accepted(0, 1),
                }
                Ok(outcome)
            }
            Err(err) => {
                self.on_rejected(source, &err);
                Err(err)
            }
        }
    }

    /// Append an ordered batch, stopping at the first refused sample
    ///
    /// Returns the number of samples stored.
    pub fn push_batch(&self, batch: &[Sample]) -> Result<usize, ContractError> {
        if batch.is_empty() {
            return Ok(0);
        }

        self.metrics.record_batch();
        let outcome = self.queue.extend(batch);
        self.on_accepted(outcome.accepted, outcome.evicted + outcome.discarded);

        trace!(
            source = self.queue.index(),
            batch = batch.len(),
            accepted = outcome.accepted,
            depth = self.queue.len(),
            "batch appended"
        );

        if let Some(err) = &outcome.error {
            self.on_rejected(self.queue.index(), err);
        }
        outcome.into_result()
    }

    /// Current depth of the underlying queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn on_accepted(&self, accepted: usize, dropped: usize) {
        let source = self.queue.index();
        if accepted > 0 {
            self.metrics.record_received(accepted);
            record_samples_accepted(source, accepted);
        }
        if dropped > 0 {
            self.metrics.record_dropped(dropped);
            record_samples_dropped(source, dropped);
        }
    }

    fn on_rejected(&self, source: SourceIndex, err: &ContractError) {
        self.metrics.record_rejected();
        record_samples_rejected(source, rejection_reason(err));
        warn!(source, error = %err, "sample rejected");
    }
}

/// [`SampleFeed`] that routes batches to the synchronizer's queues
#[derive(Debug, Clone)]
pub struct QueueFeed {
    writers: Vec<SourceWriter>,
    metrics: Arc<IngestionMetrics>,
}

impl QueueFeed {
    /// One writer per queue of `synchronizer`, sharing one metrics instance
    pub fn from_synchronizer(synchronizer: &Synchronizer) -> Self {
        let metrics = Arc::new(IngestionMetrics::new());
        let writers = synchronizer
            .queues()
            .iter()
            .map(|queue| SourceWriter::new(queue.clone(), metrics.clone()))
            .collect();
        Self { writers, metrics }
    }

    /// Writer for `source`
    pub fn writer(&self, source: SourceIndex) -> Option<SourceWriter> {
        self.writers.get(source).cloned()
    }

    pub fn source_count(&self) -> usize {
        self.writers.len()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

impl SampleFeed for QueueFeed {
    fn on_samples(&self, source: SourceIndex, batch: &[Sample]) -> Result<usize, ContractError> {
        match self.writers.get(source) {
            Some(writer) => writer.push_batch(batch),
            None => {
                let err = ContractError::SourceOutOfRange {
                    source_index: source,
                    source_count: self.writers.len(),
                };
                self.metrics.record_rejected();
                record_samples_rejected(source, rejection_reason(&err));
                warn!(source, error = %err, "batch for unknown source");
                Err(err)
            }
        }
    }
}
