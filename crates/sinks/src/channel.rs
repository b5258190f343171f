//! ChannelSink - hands tuples to an in-process consumer

use contracts::{AlignedTuple, ContractError, TupleSink};
use tokio::sync::mpsc;
use tracing::debug;

/// Sink backed by a bounded tokio mpsc channel
///
/// A full channel makes `write` wait, so a slow consumer throttles the
/// ingestion loop.
pub struct ChannelSink {
    name: String,
    tx: Option<mpsc::Sender<AlignedTuple>>,
}

impl ChannelSink {
    /// Create the sink and the receiving end
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<AlignedTuple>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                name: name.into(),
                tx: Some(tx),
            },
            rx,
        )
    }

    fn closed(&self) -> ContractError {
        ContractError::SinkClosed {
            sink_name: self.name.clone(),
        }
    }
}

impl TupleSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, tuple: &AlignedTuple) -> Result<(), ContractError> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(self.closed());
        };
        if tx.send(tuple.clone()).await.is_err() {
            debug!(sink = %self.name, "channel receiver dropped");
            return Err(self.closed());
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Drops the sender so the receiver sees the end of the stream
    async fn close(&mut self) -> Result<(), ContractError> {
        self.tx.take();
        Ok(())
    }
}
