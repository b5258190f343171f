//! Per-source sample queue.
//!
//! A bounded FIFO backed by a `HeapRb`. One producer appends at the tail,
//! the synchronizer pops at the head; both go through the same mutex, so
//! append, pop and len never interleave.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use contracts::{ContractError, OverflowPolicy, QueueConfig, QueueStats, Sample, SourceIndex};
use ringbuf::{traits::*, HeapRb};
use tracing::trace;

/// Result of a single append
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppendOutcome {
    /// Stored at the tail
    Accepted,
    /// Stored at the tail after evicting the returned head sample
    Evicted(Sample),
    /// Queue full, incoming sample thrown away
    Discarded,
}

/// Result of a batch append
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Samples stored (including those that evicted an older one)
    pub accepted: usize,
    /// Older samples evicted to make room
    pub evicted: usize,
    /// Incoming samples thrown away
    pub discarded: usize,
    /// Error that stopped the batch, if any; later samples were not applied
    pub error: Option<ContractError>,
}

impl BatchOutcome {
    /// Accepted count, or the error that cut the batch short
    pub fn into_result(self) -> Result<usize, ContractError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.accepted),
        }
    }
}

/// Mutable queue state, only reachable through the queue's lock
pub(crate) struct QueueState {
    ring: HeapRb<Sample>,
    last_timestamp: Option<f64>,
    last_arrival: Option<Instant>,
    appended: u64,
    dropped: u64,
    rejected: u64,
}

impl QueueState {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Sample> {
        self.ring.try_pop()
    }

    #[inline]
    fn head(&self) -> Option<Sample> {
        self.ring.iter().next().copied()
    }
}

/// Bounded FIFO of samples for one source
pub struct StreamQueue {
    index: SourceIndex,
    capacity: usize,
    policy: OverflowPolicy,
    state: Mutex<QueueState>,
}

impl fmt::Debug for StreamQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamQueue")
            .field("index", &self.index)
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}

impl StreamQueue {
    /// Create a new queue for source `index`
    pub fn new(index: SourceIndex, config: &QueueConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            index,
            capacity,
            policy: config.overflow_policy,
            state: Mutex::new(QueueState {
                ring: HeapRb::new(capacity),
                last_timestamp: None,
                last_arrival: None,
                appended: 0,
                dropped: 0,
                rejected: 0,
            }),
        }
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Source index this queue belongs to
    pub fn index(&self) -> SourceIndex {
        self.index
    }

    /// Maximum number of buffered samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Append a sample at the tail
    ///
    /// # Errors
    /// - `NonMonotonicTimestamp` if the timestamp is NaN or lower than the
    ///   previous one
    /// - `QueueFull` if full under [`OverflowPolicy::Reject`]
    pub fn append(&self, sample: Sample) -> Result<AppendOutcome, ContractError> {
        let mut state = self.lock();
        self.append_locked(&mut state, sample)
    }

    /// Append an ordered batch under a single lock acquisition
    ///
    /// Stops at the first refused sample.
    pub fn extend(&self, batch: &[Sample]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut state = self.lock();
        for sample in batch {
            match self.append_locked(&mut state, *sample) {
                Ok(AppendOutcome::Accepted) => outcome.accepted += 1,
                Ok(AppendOutcome::Evicted(_)) => {
                    outcome.accepted += 1;
                    outcome.evicted += 1;
                }
                Ok(AppendOutcome::Discarded) => outcome.discarded += 1,
                Err(err) => {
                    outcome.error = Some(err);
                    break;
                }
            }
        }
        outcome
    }

    fn append_locked(
        &self,
        state: &mut QueueState,
        sample: Sample,
    ) -> Result<AppendOutcome, ContractError> {
        let regressed = state
            .last_timestamp
            .is_some_and(|last| sample.timestamp < last);
        if sample.timestamp.is_nan() || regressed {
            state.rejected += 1;
            return Err(ContractError::NonMonotonicTimestamp {
                source_index: self.index,
                last: state.last_timestamp.unwrap_or(f64::NEG_INFINITY),
                got: sample.timestamp,
            });
        }

        state.last_arrival = Some(Instant::now());

        let mut evicted = None;
        if state.ring.is_full() {
            match self.policy {
                OverflowPolicy::DropOldest => {
                    evicted = state.ring.try_pop();
                    state.dropped += 1;
                }
                OverflowPolicy::DropNewest => {
                    state.dropped += 1;
                    state.last_timestamp = Some(sample.timestamp);
                    trace!(source = self.index, "queue full, newest sample discarded");
                    return Ok(AppendOutcome::Discarded);
                }
                OverflowPolicy::Reject => {
                    state.rejected += 1;
                    return Err(ContractError::QueueFull {
                        source_index: self.index,
                        capacity: self.capacity,
                    });
                }
            }
        }

        // Cannot fail: a slot is free at this point
        let _ = state.ring.try_push(sample);
        state.last_timestamp = Some(sample.timestamp);
        state.appended += 1;

        Ok(match evicted {
            Some(old) => {
                trace!(source = self.index, evicted_ts = old.timestamp, "queue full, oldest sample evicted");
                AppendOutcome::Evicted(old)
            }
            None => AppendOutcome::Accepted,
        })
    }

    /// Remove and return the oldest sample
    pub fn pop_front(&self) -> Option<Sample> {
        self.lock().pop()
    }

    /// Oldest sample without removing it
    pub fn peek_front(&self) -> Option<Sample> {
        self.lock().head()
    }

    /// Current number of buffered samples
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Samples accepted since creation
    pub fn appended_count(&self) -> u64 {
        self.lock().appended
    }

    /// Samples lost to the overflow policy
    pub fn dropped_count(&self) -> u64 {
        self.lock().dropped
    }

    /// Samples refused with an error
    pub fn rejected_count(&self) -> u64 {
        self.lock().rejected
    }

    /// Time since the last append carrying a valid timestamp
    pub fn last_append_age(&self) -> Option<Duration> {
        self.lock().last_arrival.map(|at| at.elapsed())
    }

    /// Empty the queue, returning how many samples were discarded
    pub fn drain(&self) -> usize {
        self.lock().ring.pop_iter().count()
    }

    /// Snapshot of depth and counters
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            depth: state.len(),
            appended: state.appended,
            dropped: state.dropped,
            rejected: state.rejected,
            head_timestamp: state.head().map(|s| s.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize, policy: OverflowPolicy) -> StreamQueue {
        StreamQueue::new(
            0,
            &QueueConfig {
                capacity,
                overflow_policy: policy,
            },
        )
    }

    #[test]
    fn test_fifo_order() {
        let q = queue(10, OverflowPolicy::DropOldest);
        for i in 0..5 {
            q.append(Sample::new(i as f64, i as f64 * 10.0)).unwrap();
        }

        let values: Vec<f64> = std::iter::from_fn(|| q.pop_front()).map(|s| s.value).collect();
        assert_eq!(values, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!(q.pop_front().is_none());
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let q = queue(10, OverflowPolicy::DropOldest);
        q.append(Sample::new(1.0, 1.0)).unwrap();
        assert_eq!(q.append(Sample::new(1.0, 2.0)).unwrap(), AppendOutcome::Accepted);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_timestamp_regression_rejected() {
        let q = queue(10, OverflowPolicy::DropOldest);
        q.append(Sample::new(2.0, 0.0)).unwrap();

        let err = q.append(Sample::new(1.0, 0.0)).unwrap_err();
        assert!(matches!(
            err,
            ContractError::NonMonotonicTimestamp { last, got, .. } if last == 2.0 && got == 1.0
        ));
        assert!(q.append(Sample::new(f64::NAN, 0.0)).is_err());
        assert_eq!(q.len(), 1);
        assert_eq!(q.rejected_count(), 2);
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let q = queue(3, OverflowPolicy::DropOldest);
        for i in 0..3 {
            q.append(Sample::new(i as f64, 0.0)).unwrap();
        }

        let outcome = q.append(Sample::new(3.0, 0.0)).unwrap();
        assert_eq!(outcome, AppendOutcome::Evicted(Sample::new(0.0, 0.0)));
        assert_eq!(q.len(), 3);
        assert_eq!(q.dropped_count(), 1);
        assert_eq!(q.peek_front().unwrap().timestamp, 1.0);
    }

    #[test]
    fn test_drop_newest_discards_incoming() {
        let q = queue(2, OverflowPolicy::DropNewest);
        q.append(Sample::new(0.0, 0.0)).unwrap();
        q.append(Sample::new(1.0, 0.0)).unwrap();

        assert_eq!(q.append(Sample::new(2.0, 0.0)).unwrap(), AppendOutcome::Discarded);
        assert_eq!(q.len(), 2);
        assert_eq!(q.dropped_count(), 1);
        assert_eq!(q.pop_front().unwrap().timestamp, 0.0);
        assert_eq!(q.pop_front().unwrap().timestamp, 1.0);
    }

    #[test]
    fn test_reject_policy_errors_when_full() {
        let q = queue(1, OverflowPolicy::Reject);
        q.append(Sample::new(0.0, 0.0)).unwrap();

        let err = q.append(Sample::new(1.0, 0.0)).unwrap_err();
        assert!(matches!(err, ContractError::QueueFull { capacity: 1, .. }));
        assert_eq!(q.rejected_count(), 1);
    }

    #[test]
    fn test_extend_stops_at_first_error() {
        let q = queue(10, OverflowPolicy::DropOldest);
        let batch = [
            Sample::new(0.0, 0.0),
            Sample::new(1.0, 0.0),
            Sample::new(0.5, 0.0),
            Sample::new(2.0, 0.0),
        ];

        let outcome = q.extend(&batch);
        assert_eq!(outcome.accepted, 2);
        assert!(outcome.error.is_some());
        assert_eq!(q.len(), 2);
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_drain_and_stats() {
        let q = queue(4, OverflowPolicy::DropOldest);
        assert!(q.last_append_age().is_none());
        assert_eq!(q.extend(&[Sample::new(5.0, 1.0), Sample::new(6.0, 2.0)]).into_result().unwrap(), 2);

        let stats = q.stats();
        assert_eq!(stats.depth, 2);
        assert_eq!(stats.appended, 2);
        assert_eq!(stats.head_timestamp, Some(5.0));
        assert!(q.last_append_age().is_some());

        assert_eq!(q.drain(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let q = queue(0, OverflowPolicy::DropOldest);
        assert_eq!(q.capacity(), 1);
        q.append(Sample::new(0.0, 0.0)).unwrap();
        assert_eq!(q.len(), 1);
    }
}
