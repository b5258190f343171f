//! Pipeline orchestrator - wires producers, loop and sink together.
//!
//! Every configured source gets a synthetic `MockSampleSource`; the loop
//! runs until the shutdown signal fires or a limit is reached.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::SyncerConfig;
use ingestion::{
    IngestionLoop, LoopLimits, MockSampleSource, MockSourceConfig, ProducerSet, QueueFeed,
    ShutdownSignal,
};
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated syncer configuration
    pub config: SyncerConfig,

    /// Maximum number of tuples to emit (None = unlimited)
    pub max_tuples: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Sample rate of each synthetic source
    pub sample_rate_hz: f64,

    /// Samples per synthetic batch
    pub batch_size: usize,

    /// Source left without a producer
    pub mute_source: Option<usize>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    shutdown: ShutdownSignal,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Handle that stops the run gracefully
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let syncer = &self.config.config;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Sink
        let sink = sinks::create_sink(&syncer.sink)
            .await
            .context("Failed to create sink")?;

        // Synchronizer + loop
        let limits = LoopLimits {
            max_tuples: self.config.max_tuples,
            stop_when_starved: false,
        };
        let ingestion = IngestionLoop::from_config(syncer, sink)
            .context("Failed to build synchronizer")?
            .with_limits(limits)
            .with_shutdown(self.shutdown.clone());

        // Producers
        let mut producers = ProducerSet::new(QueueFeed::from_synchronizer(ingestion.synchronizer()));
        for (index, source) in syncer.sources.iter().enumerate() {
            if self.config.mute_source == Some(index) {
                warn!(source_id = %source.id, index, "Source muted, no tuples will be emitted");
                continue;
            }
            let mock = MockSampleSource::new(MockSourceConfig {
                source_id: source.id.clone(),
                sample_rate_hz: self.config.sample_rate_hz,
                batch_size: self.config.batch_size,
                // Distinct signal per channel
                signal_hz: 1.0 + index as f64 * 0.5,
                ..Default::default()
            });
            producers
                .register(index, Box::new(mock))
                .with_context(|| format!("Failed to register source '{}'", source.id))?;
        }

        let active_sources = producers.len();
        info!(
            sources = syncer.source_count(),
            active_sources,
            sink = %syncer.sink.name,
            max_tuples = ?self.config.max_tuples,
            "Pipeline configured"
        );

        // Optional timeout
        if let Some(timeout) = self.config.timeout {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                        shutdown.trigger();
                    }
                    _ = shutdown.cancelled() => {}
                }
            });
        }

        // Start
        producers.start_all();
        let loop_stats = ingestion.spawn().await.context("Ingestion loop panicked")?;

        // Shutdown
        info!("Shutting down pipeline...");
        producers.stop_all();
        self.shutdown.trigger();

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            active_sources,
            ingestion: producers.metrics().snapshot(),
            source_ids: syncer.sources.iter().map(|s| s.id.clone()).collect(),
            loop_stats,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            tps = format!("{:.2}", stats.tuples_per_second()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
