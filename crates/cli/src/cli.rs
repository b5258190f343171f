//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stream Syncer - multi-stream synchronization buffer with adaptive pacing
#[derive(Parser, Debug)]
#[command(
    name = "stream-syncer",
    author,
    version,
    about = "Multi-stream synchronization buffer with adaptive pacing",
    long_about = "Buffers samples from independent sources in per-source queues and emits\n\
                  aligned tuples (one sample per source) at a cadence that adapts to the\n\
                  backlog, forwarding them to the configured sink."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STREAM_SYNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STREAM_SYNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the synchronizer with synthetic sources
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "syncer.toml",
        env = "STREAM_SYNCER_CONFIG"
    )]
    pub config: PathBuf,

    /// Maximum number of aligned tuples to emit (0 = unlimited)
    #[arg(long, default_value = "0", env = "STREAM_SYNCER_MAX_TUPLES")]
    pub max_tuples: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "STREAM_SYNCER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Sample rate of each synthetic source (Hz)
    #[arg(long, default_value = "100", env = "STREAM_SYNCER_SAMPLE_RATE")]
    pub sample_rate: f64,

    /// Samples per synthetic batch
    #[arg(long, default_value = "10", env = "STREAM_SYNCER_BATCH_SIZE")]
    pub batch_size: usize,

    /// Index of a source to leave without a producer (silent-source drill)
    #[arg(long)]
    pub mute_source: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "STREAM_SYNCER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "syncer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "syncer.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show pacing, queue and health tuning
    #[arg(long)]
    pub tuning: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "stream-syncer",
            "-v",
            "run",
            "--config",
            "seismic.toml",
            "--max-tuples",
            "50",
            "--mute-source",
            "2",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("seismic.toml"));
                assert_eq!(args.max_tuples, 50);
                assert_eq!(args.mute_source, Some(2));
                assert_eq!(args.batch_size, 10);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
