//! Producer registry

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{SampleSource, SourceIndex};
use tracing::{debug, info, instrument};

use crate::adapter::SourceAdapter;
use crate::error::{IngestionError, Result};
use crate::feed::QueueFeed;
use crate::metrics::IngestionMetrics;

/// Set of producers feeding one synchronizer
///
/// Each source index gets at most one [`SampleSource`]. Sources are stopped
/// when the set is dropped.
pub struct ProducerSet {
    feed: QueueFeed,
    adapters: BTreeMap<SourceIndex, SourceAdapter>,
}

impl ProducerSet {
    pub fn new(feed: QueueFeed) -> Self {
        Self {
            feed,
            adapters: BTreeMap::new(),
        }
    }

    /// Attach `source` as the producer of queue `index`
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source),
        fields(source_id = %source.source_id())
    )]
    pub fn register(&mut self, index: SourceIndex, source: Box<dyn SampleSource>) -> Result<()> {
        let writer = self
            .feed
            .writer(index)
            .ok_or(IngestionError::SourceOutOfRange {
                source_index: index,
                source_count: self.feed.source_count(),
            })?;

        if let Some(existing) = self.adapters.get(&index) {
            return Err(IngestionError::AlreadyRegistered {
                source_index: index,
                source_id: existing.source_id().to_string(),
            });
        }

        debug!(index, "registered sample source");
        self.adapters.insert(index, SourceAdapter::new(source, writer));
        Ok(())
    }

    /// Start all registered sources
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all sample sources");
        for adapter in self.adapters.values() {
            adapter.start();
        }
    }

    /// Stop all sources
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all sample sources");
        for adapter in self.adapters.values() {
            adapter.stop();
        }
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Source indices with no producer attached
    pub fn unregistered(&self) -> Vec<SourceIndex> {
        (0..self.feed.source_count())
            .filter(|i| !self.adapters.contains_key(i))
            .collect()
    }

    /// Check if the producer of `index` is listening
    pub fn is_source_listening(&self, index: SourceIndex) -> bool {
        self.adapters
            .get(&index)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }

    pub fn feed(&self) -> &QueueFeed {
        &self.feed
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.feed.metrics()
    }
}

impl Drop for ProducerSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSampleSource;
    use contracts::QueueConfig;
    use std::time::{Duration, Instant};
    use sync_engine::Synchronizer;

    fn producers(n: usize) -> (Synchronizer, ProducerSet) {
        let sync = Synchronizer::new(n, &QueueConfig::default()).unwrap();
        let set = ProducerSet::new(QueueFeed::from_synchronizer(&sync));
        (sync, set)
    }

    #[test]
    fn test_register_out_of_range() {
        let (_sync, mut set) = producers(1);
        let err = set
            .register(1, Box::new(MockSampleSource::finite("x", 1)))
            .unwrap_err();
        assert!(matches!(err, IngestionError::SourceOutOfRange { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_register_twice() {
        let (_sync, mut set) = producers(2);
        set.register(0, Box::new(MockSampleSource::finite("a", 1)))
            .unwrap();
        let err = set
            .register(0, Box::new(MockSampleSource::finite("b", 1)))
            .unwrap_err();
        assert!(matches!(err, IngestionError::AlreadyRegistered { source_index: 0, .. }));
        assert_eq!(set.unregistered(), vec![1]);
    }

    #[test]
    fn test_start_fills_queues() {
        let (sync, mut set) = producers(2);
        set.register(0, Box::new(MockSampleSource::finite("a", 5)))
            .unwrap();
        set.register(1, Box::new(MockSampleSource::finite("b", 3)))
            .unwrap();
        set.start_all();
        assert!(set.is_source_listening(0));

        let deadline = Instant::now() + Duration::from_secs(2);
        while sync.backlog() < 8 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(sync.queue(0).unwrap().len(), 5);
        assert_eq!(sync.queue(1).unwrap().len(), 3);
        assert_eq!(set.metrics().snapshot().samples_received, 8);

        set.stop_all();
        assert!(!set.is_source_listening(1));
    }
}
