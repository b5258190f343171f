//! # Sync Engine
//!
//! Multi-source synchronization buffer with adaptive pacing.
//!
//! Responsible for:
//! - Bounded per-source FIFO queues (`StreamQueue`)
//! - All-or-nothing emission of aligned tuples (`Synchronizer`)
//! - Backlog-driven delay between attempts (`PacingController`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::{PacingController, Synchronizer};
//!
//! let mut sync = Synchronizer::new(3, &QueueConfig::default())?;
//! let mut pacing = PacingController::new(PacingConfig::default());
//!
//! // Producers append through their queue handle
//! sync.queue(0).unwrap().append(Sample::new(0.0, 1.5))?;
//!
//! let delay = pacing.update(sync.backlog());
//! if let Some(tuple) = sync.try_emit() {
//!     // Handle aligned tuple
//! }
//! ```

mod buffer;
mod engine;
mod pacing;

pub use buffer::{AppendOutcome, BatchOutcome, StreamQueue};
pub use engine::Synchronizer;
pub use pacing::{BacklogZone, PacingController};

// Re-export contracts types
pub use contracts::{
    AlignedTuple, BufferStats, OverflowPolicy, PacingConfig, QueueConfig, QueueStats, Sample,
    SourceHealth, SourceIndex,
};
