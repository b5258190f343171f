//! Layered error definitions
//!
//! Categorized by source: config / ingest / queue / sink

use thiserror::Error;

use crate::SourceIndex;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Ingest Errors =====
    /// Producer addressed a source that was never registered
    #[error("source index {source_index} out of range (source count {source_count})")]
    SourceOutOfRange {
        source_index: SourceIndex,
        source_count: usize,
    },

    /// Sample timestamp went backwards (or is NaN) for a source
    #[error(
        "non-monotonic timestamp for source {source_index}: last={last}, got={got}"
    )]
    NonMonotonicTimestamp {
        source_index: SourceIndex,
        last: f64,
        got: f64,
    },

    // ===== Queue Errors =====
    /// Queue at capacity under the `reject` overflow policy
    #[error("queue full for source {source_index}: capacity={capacity}")]
    QueueFull {
        source_index: SourceIndex,
        capacity: usize,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink is closed and accepts no more tuples
    #[error("sink '{sink_name}' closed")]
    SinkClosed { sink_name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error was produced by a producer handing over bad data,
    /// as opposed to a capacity or infrastructure problem.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::NonMonotonicTimestamp { .. } | Self::SourceOutOfRange { .. }
        )
    }
}
