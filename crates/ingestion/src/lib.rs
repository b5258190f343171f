//! # Ingestion
//!
//! Producer side of the syncer and the loop that drives it.
//!
//! Responsibilities:
//! - Route producer batches into per-source queues (`QueueFeed`, `SourceWriter`)
//! - Attach `SampleSource` producers (mock or real) to their queue
//! - Pace synchronization attempts and forward aligned tuples to a sink
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionLoop, MockSampleSource, ProducerSet, QueueFeed};
//!
//! let ingestion = IngestionLoop::from_config(&config, sink)?;
//!
//! let mut producers = ProducerSet::new(QueueFeed::from_synchronizer(ingestion.synchronizer()));
//! producers.register(0, Box::new(MockSampleSource::sine("HHZ", 100.0)))?;
//! producers.start_all();
//!
//! let shutdown = ingestion.shutdown_signal();
//! let handle = ingestion.spawn();
//! // ... later ...
//! shutdown.trigger();
//! let stats = handle.await?;
//! ```

mod adapter;
mod error;
mod feed;
mod ingestion_loop;
mod metrics;
mod mock;
mod producers;
mod shutdown;

// Re-exports
pub use adapter::SourceAdapter;
pub use error::{IngestionError, Result};
pub use feed::{QueueFeed, SourceWriter};
pub use ingestion_loop::{ExitReason, IngestionLoop, LoopLimits, LoopStats};
pub use crate::metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockSampleSource, MockSourceConfig};
pub use producers::ProducerSet;
pub use shutdown::ShutdownSignal;
