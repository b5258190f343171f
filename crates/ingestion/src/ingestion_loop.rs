//! IngestionLoop: paced driver from synchronizer to sink.

use std::time::Duration;

use contracts::{ContractError, HealthConfig, PacingConfig, SyncerConfig, TupleSink};
use observability::metrics::{
    record_pacing, record_queue_depths, record_sink_write, record_source_silent,
};
use observability::{LoopMetricsAggregator, MetricsSummary};
use sync_engine::{PacingController, Synchronizer};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::shutdown::ShutdownSignal;

/// Optional stop conditions besides cancellation
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopLimits {
    /// Stop after this many tuples
    pub max_tuples: Option<u64>,
    /// Stop on the first attempt that yields nothing
    pub stop_when_starved: bool,
}

impl LoopLimits {
    /// Run until the preloaded queues can no longer form a tuple
    pub fn drain_available() -> Self {
        Self {
            max_tuples: None,
            stop_when_starved: true,
        }
    }

    pub fn max_tuples(max: u64) -> Self {
        Self {
            max_tuples: Some(max),
            stop_when_starved: false,
        }
    }
}

/// Why the loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Cancelled,
    MaxTuples,
    Starved,
}

/// Final loop report
#[derive(Debug, Clone)]
pub struct LoopStats {
    pub exit_reason: ExitReason,
    /// Tuples handed out by the synchronizer
    pub tuples_emitted: u64,
    /// Tuples the sink accepted
    pub tuples_written: u64,
    /// Failed sink writes
    pub sink_errors: u64,
    /// Silent-source warnings raised
    pub silent_warnings: u64,
    /// Per-source depth right before the shutdown drain
    pub leftover_depths: Vec<usize>,
    /// Samples discarded by the shutdown drain
    pub discarded_on_shutdown: usize,
    /// Pacing delay when the loop stopped
    pub final_delay_ms: f64,
    pub summary: MetricsSummary,
}

/// Pacing-driven synchronization loop
///
/// Each iteration feeds the backlog to the [`PacingController`], sleeps the
/// returned delay, attempts one emission and forwards the tuple to the sink.
pub struct IngestionLoop<S> {
    synchronizer: Synchronizer,
    pacing: PacingController,
    sink: S,
    health: HealthConfig,
    limits: LoopLimits,
    shutdown: ShutdownSignal,
    aggregator: LoopMetricsAggregator,
}

impl<S: TupleSink> IngestionLoop<S> {
    pub fn new(synchronizer: Synchronizer, pacing: PacingConfig, sink: S) -> Self {
        Self {
            synchronizer,
            pacing: PacingController::new(pacing),
            sink,
            health: HealthConfig::default(),
            limits: LoopLimits::default(),
            shutdown: ShutdownSignal::new(),
            aggregator: LoopMetricsAggregator::new(),
        }
    }

    /// Build synchronizer, pacing and health settings from a full config
    pub fn from_config(config: &SyncerConfig, sink: S) -> Result<Self, ContractError> {
        let synchronizer = Synchronizer::new(config.source_count(), &config.queue)?;
        Ok(Self::new(synchronizer, config.pacing.clone(), sink).with_health(config.health.clone()))
    }

    pub fn with_health(mut self, health: HealthConfig) -> Self {
        self.health = health;
        self
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Share an externally owned shutdown signal
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle that stops the loop when triggered
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// The synchronizer, for wiring producers before the loop starts
    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    /// Run on a new tokio task
    pub fn spawn(self) -> JoinHandle<LoopStats>
    where
        S: 'static,
    {
        tokio::spawn(self.run())
    }

    /// Run until cancelled or a [`LoopLimits`] condition is met
    #[instrument(
        name = "ingestion_loop_run",
        skip(self),
        fields(sources = self.synchronizer.source_count(), sink = %self.sink.name())
    )]
    pub async fn run(mut self) -> LoopStats {
        let sink_name = self.sink.name().to_string();
        let silence_timeout = Duration::try_from_secs_f64(self.health.silence_timeout_s)
            .unwrap_or(Duration::from_secs(5));
        let check_interval = Duration::from_millis(self.health.check_interval_ms.max(1));
        let mut last_health_check = Instant::now();

        let mut tuples_written = 0u64;
        let mut sink_errors = 0u64;
        let mut silent_warnings = 0u64;

        info!(
            initial_delay_ms = self.pacing.current_delay_ms(),
            limits = ?self.limits,
            "ingestion loop started"
        );

        let exit_reason = loop {
            if self.shutdown.is_triggered() {
                break ExitReason::Cancelled;
            }

            let backlog = self.synchronizer.backlog();
            let delay = self.pacing.update(backlog);
            let delay_ms = self.pacing.current_delay_ms();
            record_pacing(delay_ms, backlog);
            self.aggregator.record_attempt(delay_ms, backlog);

            tokio::select! {
                _ = self.shutdown.cancelled() => break ExitReason::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.synchronizer.try_emit() {
                Some(tuple) => {
                    self.aggregator.record_tuple(&tuple);
                    match self.sink.write(&tuple).await {
                        Ok(()) => {
                            tuples_written += 1;
                            record_sink_write(&sink_name, true);
                        }
                        Err(e) => {
                            sink_errors += 1;
                            record_sink_write(&sink_name, false);
                            warn!(sink = %sink_name, tuple_id = tuple.tuple_id, error = %e, "sink write failed");
                        }
                    }

                    if self
                        .limits
                        .max_tuples
                        .is_some_and(|max| self.synchronizer.emitted_count() >= max)
                    {
                        break ExitReason::MaxTuples;
                    }
                }
                None => {
                    self.aggregator.record_empty();
                    if self.limits.stop_when_starved {
                        break ExitReason::Starved;
                    }
                }
            }

            if last_health_check.elapsed() >= check_interval {
                silent_warnings += self.check_health(silence_timeout);
                last_health_check = Instant::now();
            }
        };

        self.finish(exit_reason, &sink_name, tuples_written, sink_errors, silent_warnings)
            .await
    }

    /// Warn about every silent source, returning how many were reported
    fn check_health(&mut self, silence_timeout: Duration) -> u64 {
        let stats = self.synchronizer.buffer_stats();
        record_queue_depths(&stats);

        let silent = self.synchronizer.silent_sources(silence_timeout);
        for health in &silent {
            let silent_secs = health.silent_for.map(|d| d.as_secs_f64());
            record_source_silent(health.source_index, silent_secs);
            self.aggregator.record_silent(health.source_index);
            warn!(
                source = health.source_index,
                silent_for_s = ?silent_secs,
                depth = stats.queues.get(health.source_index).map(|q| q.depth),
                "source silent"
            );
        }

        debug!(backlog = stats.total_samples, silent = silent.len(), "health check");
        silent.len() as u64
    }

    async fn finish(
        mut self,
        exit_reason: ExitReason,
        sink_name: &str,
        tuples_written: u64,
        sink_errors: u64,
        silent_warnings: u64,
    ) -> LoopStats {
        if let Err(e) = self.sink.flush().await {
            warn!(sink = %sink_name, error = %e, "sink flush failed");
        }
        if let Err(e) = self.sink.close().await {
            warn!(sink = %sink_name, error = %e, "sink close failed");
        }

        let leftover_depths: Vec<usize> = self
            .synchronizer
            .queues()
            .iter()
            .map(|q| q.len())
            .collect();
        let discarded_on_shutdown = self.synchronizer.drain();

        let stats = LoopStats {
            exit_reason,
            tuples_emitted: self.synchronizer.emitted_count(),
            tuples_written,
            sink_errors,
            silent_warnings,
            leftover_depths,
            discarded_on_shutdown,
            final_delay_ms: self.pacing.current_delay_ms(),
            summary: self.aggregator.summary(),
        };

        info!(
            ?exit_reason,
            tuples_emitted = stats.tuples_emitted,
            tuples_written,
            sink_errors,
            discarded = discarded_on_shutdown,
            "ingestion loop stopped"
        );
        stats
    }
}
