//! TupleSink trait - consumer side output interface

use crate::{AlignedTuple, ContractError};

/// Data output trait
///
/// The ingestion loop awaits `write` inline, so a slow sink directly
/// throttles emission.
#[trait_variant::make(TupleSink: Send)]
pub trait LocalTupleSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one aligned tuple
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, tuple: &AlignedTuple) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
