//! Config-driven sink selection

use contracts::{AlignedTuple, ContractError, SinkConfig, SinkType, TupleSink};
use tracing::info;

use crate::json_lines::{FileSink, StdoutSink};
use crate::log::LogSink;

/// Sink chosen from [`SinkConfig`]
pub enum ConfiguredSink {
    Log(LogSink),
    Stdout(StdoutSink),
    File(FileSink),
}

/// Create the sink described by `config`
///
/// # Errors
/// `ConfigValidation` for a `file` sink without `path`, IO errors when the
/// file cannot be opened
pub async fn create_sink(config: &SinkConfig) -> Result<ConfiguredSink, ContractError> {
    let sink = match config.sink_type {
        SinkType::Log => ConfiguredSink::Log(LogSink::new(&config.name)),
        SinkType::Stdout => ConfiguredSink::Stdout(StdoutSink::stdout(&config.name)),
        SinkType::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                ContractError::config_validation("sink.path", "file sink requires a path")
            })?;
            ConfiguredSink::File(FileSink::create(&config.name, path).await?)
        }
    };
    info!(sink = %config.name, sink_type = ?config.sink_type, "sink created");
    Ok(sink)
}

impl TupleSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Log(s) => s.name(),
            Self::Stdout(s) => s.name(),
            Self::File(s) => s.name(),
        }
    }

    async fn write(&mut self, tuple: &AlignedTuple) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.write(tuple).await,
            Self::Stdout(s) => s.write(tuple).await,
            Self::File(s) => s.write(tuple).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.flush().await,
            Self::Stdout(s) => s.flush().await,
            Self::File(s) => s.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(s) => s.close().await,
            Self::Stdout(s) => s.close().await,
            Self::File(s) => s.close().await,
        }
    }
}
