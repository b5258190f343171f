//! Buffer diagnostics shared between the engine and its observers.

use std::time::Duration;

use crate::SourceIndex;

/// Per-source queue status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueStats {
    /// Current depth
    pub depth: usize,

    /// Samples accepted since start
    pub appended: u64,

    /// Samples lost to the overflow policy
    pub dropped: u64,

    /// Samples refused (timestamp regression or `reject` policy)
    pub rejected: u64,

    /// Timestamp of the head sample
    pub head_timestamp: Option<f64>,
}

/// Snapshot of all queues (for diagnostics)
#[derive(Debug, Clone, Default)]
pub struct BufferStats {
    /// Status per source, in source order
    pub queues: Vec<QueueStats>,

    /// Total buffered samples (the backlog)
    pub total_samples: usize,

    /// Oldest head timestamp across sources
    pub oldest_timestamp: Option<f64>,

    /// Newest head timestamp across sources
    pub newest_timestamp: Option<f64>,
}

impl BufferStats {
    /// Sources whose queue is currently empty
    pub fn empty_sources(&self) -> Vec<SourceIndex> {
        self.queues
            .iter()
            .enumerate()
            .filter(|(_, q)| q.depth == 0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// A source that has not produced for a while
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceHealth {
    pub source_index: SourceIndex,

    /// Time since the last accepted append, `None` if nothing ever arrived
    pub silent_for: Option<Duration>,
}
