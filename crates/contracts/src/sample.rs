//! Sample / AlignedTuple - the unit of data in and out of the syncer

use serde::{Deserialize, Serialize};

/// Stable index of a source, `0..N-1` in registration order.
pub type SourceIndex = usize;

/// One timestamped reading from a single source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Producer timestamp (non-decreasing per source)
    pub timestamp: f64,

    /// Reading value
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self { timestamp, value }
    }
}

/// Aligned tuple
///
/// One synchronized emission: exactly one sample from every source, in
/// source order. `timestamps[i]` and `values[i]` belong to source `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTuple {
    /// Emission sequence number (1-based, strictly increasing)
    pub tuple_id: u64,

    /// Per-source timestamps
    pub timestamps: Vec<f64>,

    /// Per-source values
    pub values: Vec<f64>,
}

impl AlignedTuple {
    /// Build a tuple from per-source samples given in source order.
    pub fn from_samples(tuple_id: u64, samples: &[Sample]) -> Self {
        Self {
            tuple_id,
            timestamps: samples.iter().map(|s| s.timestamp).collect(),
            values: samples.iter().map(|s| s.value).collect(),
        }
    }

    /// Number of sources in the tuple
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample contributed by `source`
    pub fn sample(&self, source: SourceIndex) -> Option<Sample> {
        let timestamp = *self.timestamps.get(source)?;
        let value = *self.values.get(source)?;
        Some(Sample { timestamp, value })
    }

    /// Iterate over `(source, sample)` pairs in source order
    pub fn samples(&self) -> impl Iterator<Item = (SourceIndex, Sample)> + '_ {
        self.timestamps
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(i, (&timestamp, &value))| (i, Sample { timestamp, value }))
    }

    /// Max minus min timestamp across sources.
    ///
    /// Queues are drained FIFO without timestamp alignment, so drifting
    /// sources show up here rather than being corrected.
    pub fn timestamp_spread(&self) -> f64 {
        let mut iter = self.timestamps.iter().copied();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        max - min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_from_samples_keeps_source_order() {
        let samples = [
            Sample::new(1.0, 10.0),
            Sample::new(1.5, 20.0),
            Sample::new(0.5, 30.0),
        ];
        let tuple = AlignedTuple::from_samples(7, &samples);

        assert_eq!(tuple.tuple_id, 7);
        assert_eq!(tuple.len(), 3);
        assert_eq!(tuple.sample(1), Some(Sample::new(1.5, 20.0)));
        assert_eq!(tuple.sample(3), None);

        let collected: Vec<_> = tuple.samples().map(|(i, s)| (i, s.value)).collect();
        assert_eq!(collected, vec![(0, 10.0), (1, 20.0), (2, 30.0)]);
    }

    #[test]
    fn test_timestamp_spread() {
        let tuple = AlignedTuple::from_samples(
            1,
            &[Sample::new(3.0, 0.0), Sample::new(1.0, 0.0), Sample::new(2.5, 0.0)],
        );
        assert!((tuple.timestamp_spread() - 2.0).abs() < 1e-12);

        let empty = AlignedTuple::from_samples(1, &[]);
        assert!(empty.is_empty());
        assert_eq!(empty.timestamp_spread(), 0.0);
    }

    #[test]
    fn test_tuple_serde_shape() {
        let tuple = AlignedTuple::from_samples(1, &[Sample::new(0.0, 1.0)]);
        let json = serde_json::to_string(&tuple).unwrap();
        assert_eq!(json, r#"{"tuple_id":1,"timestamps":[0.0],"values":[1.0]}"#);
    }
}
