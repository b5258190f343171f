//! SampleFeed / SampleSource traits - producer side abstraction
//!
//! Producers never subclass anything: an adapter for an upstream data
//! client implements [`SampleSource`] and hands its batches to a callback,
//! and the core exposes [`SampleFeed`] as the single entry point for
//! samples.

use std::sync::Arc;

use crate::{ContractError, Sample, SourceIndex};

/// Batch callback type
///
/// When a source produces data, it sends an ordered batch of samples
/// through this callback. Uses `Arc` so the callback can be shared with
/// the producer's own thread or task.
pub type SampleBatchCallback = Arc<dyn Fn(Vec<Sample>) + Send + Sync>;

/// Capability interface through which samples enter the core.
pub trait SampleFeed: Send + Sync {
    /// Deliver an ordered batch for `source`.
    ///
    /// Returns how many samples were accepted. Samples after the first
    /// refused one are not applied.
    ///
    /// # Errors
    /// `SourceOutOfRange`, `NonMonotonicTimestamp` or `QueueFull`
    fn on_samples(&self, source: SourceIndex, batch: &[Sample]) -> Result<usize, ContractError>;
}

/// Sample data source trait
///
/// Abstracts the upstream client of one channel (network client, replay,
/// synthetic generator).
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn SampleSource> = make_source();
/// source.listen(Arc::new(|batch| {
///     println!("received {} samples", batch.len());
/// }));
/// // ... later ...
/// source.stop();
/// ```
pub trait SampleSource: Send + Sync {
    /// Source ID
    fn source_id(&self) -> &str;

    /// Register data callback
    ///
    /// Repeated calls while already listening are no-ops.
    fn listen(&self, callback: SampleBatchCallback);

    /// Stop producing
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
