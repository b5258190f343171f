//! Synchronizer: all-or-nothing emission of aligned tuples.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    AlignedTuple, BufferStats, ContractError, QueueConfig, Sample, SourceHealth, SourceIndex,
};
use tracing::{debug, instrument, trace};

use crate::buffer::StreamQueue;

/// Multi-source synchronizer
///
/// Owns one [`StreamQueue`] per source. Producers get shared handles to
/// their queue through [`Synchronizer::queue`]; only the synchronizer pops.
#[derive(Debug)]
pub struct Synchronizer {
    /// Per-source queues, in source order
    queues: Vec<Arc<StreamQueue>>,
    /// Emission counter (last `tuple_id` handed out)
    emitted: u64,
    /// Construction time, used to age sources that never produced
    created_at: Instant,
}

impl Synchronizer {
    /// Create a synchronizer with `source_count` empty queues
    ///
    /// # Errors
    /// `ConfigValidation` when `source_count` is zero
    pub fn new(source_count: usize, config: &QueueConfig) -> Result<Self, ContractError> {
        if source_count == 0 {
            return Err(ContractError::config_validation(
                "sources",
                "at least one source is required",
            ));
        }

        let queues = (0..source_count)
            .map(|index| Arc::new(StreamQueue::new(index, config)))
            .collect();

        debug!(
            source_count,
            capacity = config.capacity,
            policy = ?config.overflow_policy,
            "synchronizer created"
        );

        Ok(Self {
            queues,
            emitted: 0,
            created_at: Instant::now(),
        })
    }

    /// Shared handle to the queue of `source`
    pub fn queue(&self, source: SourceIndex) -> Option<Arc<StreamQueue>> {
        self.queues.get(source).cloned()
    }

    /// All queues, in source order
    pub fn queues(&self) -> &[Arc<StreamQueue>] {
        &self.queues
    }

    /// Number of sources (N)
    pub fn source_count(&self) -> usize {
        self.queues.len()
    }

    /// Pop one sample from every queue if all of them have data
    ///
    /// Every queue lock is held (always acquired in source order) from the
    /// emptiness check until the last pop, so a concurrent append can
    /// neither make a checked queue look empty nor slip a partial tuple
    /// through. Returns `None` without touching any queue otherwise.
    #[instrument(level = "trace", name = "synchronizer_try_emit", skip(self))]
    pub fn try_emit(&mut self) -> Option<AlignedTuple> {
        let mut guards: Vec<_> = self.queues.iter().map(|q| q.lock()).collect();

        if guards.iter().any(|g| g.is_empty()) {
            trace!(
                empty = ?guards
                    .iter()
                    .enumerate()
                    .filter(|(_, g)| g.is_empty())
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>(),
                "not every source has data"
            );
            return None;
        }

        let samples: Vec<Sample> = guards
            .iter_mut()
            .enumerate()
            .map(|(source, guard)| match guard.pop() {
                Some(sample) => sample,
                None => panic!(
                    "queue {source} empty after non-empty check under lock; queue invariant broken"
                ),
            })
            .collect();
        drop(guards);

        self.emitted += 1;
        let tuple = AlignedTuple::from_samples(self.emitted, &samples);

        metrics::counter!("stream_syncer_tuples_emitted_total").increment(1);
        metrics::histogram!("stream_syncer_tuple_timestamp_spread").record(tuple.timestamp_spread());

        Some(tuple)
    }

    /// Total buffered samples across all queues
    pub fn backlog(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    /// Number of tuples emitted so far
    pub fn emitted_count(&self) -> u64 {
        self.emitted
    }

    /// Get current buffer statistics
    #[instrument(name = "synchronizer_buffer_stats", level = "trace", skip(self))]
    pub fn buffer_stats(&self) -> BufferStats {
        let queues: Vec<_> = self.queues.iter().map(|q| q.stats()).collect();

        let total_samples = queues.iter().map(|q| q.depth).sum();
        let heads = queues.iter().filter_map(|q| q.head_timestamp);
        let oldest_timestamp = heads.clone().reduce(f64::min);
        let newest_timestamp = heads.reduce(f64::max);

        BufferStats {
            queues,
            total_samples,
            oldest_timestamp,
            newest_timestamp,
        }
    }

    /// Sources with no valid append for longer than `threshold`
    ///
    /// A source that never produced counts as silent once the synchronizer
    /// itself is older than `threshold`.
    pub fn silent_sources(&self, threshold: Duration) -> Vec<SourceHealth> {
        let started_long_ago = self.created_at.elapsed() > threshold;
        self.queues
            .iter()
            .filter_map(|q| match q.last_append_age() {
                Some(age) if age > threshold => Some(SourceHealth {
                    source_index: q.index(),
                    silent_for: Some(age),
                }),
                None if started_long_ago => Some(SourceHealth {
                    source_index: q.index(),
                    silent_for: None,
                }),
                _ => None,
            })
            .collect()
    }

    /// Empty every queue, returning the number of discarded samples
    #[instrument(name = "synchronizer_drain", skip(self))]
    pub fn drain(&mut self) -> usize {
        let discarded = self.queues.iter().map(|q| q.drain()).sum();
        debug!(discarded, "synchronizer drained");
        discarded
    }
}
