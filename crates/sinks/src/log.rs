//! LogSink - logs tuple summary via tracing

use contracts::{AlignedTuple, ContractError, TupleSink};
use tracing::{info, instrument};

/// Sink that logs tuple summaries for debugging
pub struct LogSink {
    name: String,
    written: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: 0,
        }
    }

    /// Tuples logged so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl TupleSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, tuple),
        fields(sink = %self.name, tuple_id = tuple.tuple_id)
    )]
    async fn write(&mut self, tuple: &AlignedTuple) -> Result<(), ContractError> {
        self.written += 1;
        info!(
            sink = %self.name,
            tuple_id = tuple.tuple_id,
            timestamps = ?tuple.timestamps,
            values = ?tuple.values,
            spread = tuple.timestamp_spread(),
            "AlignedTuple received"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, written = self.written, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Sample;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let tuple = AlignedTuple::from_samples(1, &[Sample::new(0.0, 1.0), Sample::new(0.5, 2.0)]);

        assert!(sink.write(&tuple).await.is_ok());
        assert!(sink.flush().await.is_ok());
        assert!(sink.close().await.is_ok());
        assert_eq!(sink.written(), 1);
        assert_eq!(sink.name(), "test_log");
    }
}
