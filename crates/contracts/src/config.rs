//! SyncerConfig - Config Loader output
//!
//! Describes the complete runtime configuration: sources, pacing, queue
//! bounds, health monitoring and the output sink.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete syncer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncerConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sources in registration order (index = position)
    pub sources: Vec<SourceConfig>,

    /// Pacing controller tuning
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Per-source queue bounds
    #[serde(default)]
    pub queue: QueueConfig,

    /// Silent-source monitoring
    #[serde(default)]
    pub health: HealthConfig,

    /// Output sink
    #[serde(default)]
    pub sink: SinkConfig,
}

impl SyncerConfig {
    /// Build a config with default tuning for the given source ids
    pub fn with_sources<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: ConfigVersion::V1,
            sources: ids
                .into_iter()
                .map(|id| SourceConfig {
                    id: id.into(),
                    title: None,
                })
                .collect(),
            pacing: PacingConfig::default(),
            queue: QueueConfig::default(),
            health: HealthConfig::default(),
            sink: SinkConfig::default(),
        }
    }

    /// Number of sources (N)
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

/// One input stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique identifier (e.g. channel code "HHZ")
    pub id: String,

    /// Human readable title
    #[serde(default)]
    pub title: Option<String>,
}

impl SourceConfig {
    /// Title if present, id otherwise
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Pacing controller configuration
///
/// Delays are in milliseconds; watermarks count total buffered samples
/// across all queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay before the first synchronization attempt
    #[serde(alias = "initial_delay")]
    pub initial_delay_ms: f64,
    /// Floor (fastest draw rate)
    #[serde(alias = "min_delay")]
    pub min_delay_ms: f64,
    /// Ceiling (slowest draw rate)
    #[serde(alias = "max_delay")]
    pub max_delay_ms: f64,
    /// Backlog above which the delay shrinks
    pub high_watermark: usize,
    /// Backlog below which the delay grows
    pub low_watermark: usize,
    /// Multiplier applied above the high watermark, in (0, 1]
    pub decay_factor: f64,
    /// Multiplier applied below the low watermark, >= 1
    pub recovery_factor: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 10.0,
            min_delay_ms: 1.0,
            max_delay_ms: 50.0,
            high_watermark: 1000,
            low_watermark: 300,
            decay_factor: 0.95,
            recovery_factor: 1.05,
        }
    }
}

/// Queue bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum samples held per source
    pub capacity: usize,
    /// What a full queue does with the next sample
    pub overflow_policy: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            overflow_policy: OverflowPolicy::DropOldest,
        }
    }
}

/// Overflow policy for a full queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest buffered sample to make room
    #[default]
    DropOldest,
    /// Discard the incoming sample
    DropNewest,
    /// Refuse the incoming sample with an error
    Reject,
}

/// Silent-source monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// A source with no append for this long is reported silent
    pub silence_timeout_s: f64,
    /// How often the loop evaluates source health
    pub check_interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            silence_timeout_s: 5.0,
            check_interval_ms: 1000,
        }
    }
}

/// Output sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    #[serde(default = "default_sink_name")]
    pub name: String,

    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Output file (`file` sink only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_sink_name() -> String {
    "output".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: default_sink_name(),
            sink_type: SinkType::default(),
            path: None,
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Summaries through tracing
    #[default]
    Log,
    /// JSON lines on stdout
    Stdout,
    /// JSON lines appended to `path`
    File,
}
