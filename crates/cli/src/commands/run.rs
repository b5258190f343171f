//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        sources = config.source_count(),
        capacity = config.queue.capacity,
        overflow_policy = ?config.queue.overflow_policy,
        sink = %config.sink.name,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    check_sample_rate(args.sample_rate)?;
    if let Some(index) = args.mute_source {
        if index >= config.source_count() {
            anyhow::bail!(
                "--mute-source {} out of range ({} sources configured)",
                index,
                config.source_count()
            );
        }
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        config,
        max_tuples: if args.max_tuples == 0 {
            None
        } else {
            Some(args.max_tuples)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        sample_rate_hz: args.sample_rate,
        batch_size: args.batch_size,
        mute_source: args.mute_source,
    };

    // Create pipeline and hook graceful shutdown to Ctrl+C / SIGTERM
    let pipeline = Pipeline::new(pipeline_config);
    let shutdown = pipeline.shutdown_signal();
    tokio::spawn(async move {
        tokio::select! {
            result = wait_for_signal() => {
                match result {
                    Ok(()) => warn!("Received shutdown signal, stopping pipeline..."),
                    Err(e) => warn!(error = %e, "Signal handler failed, stopping pipeline..."),
                }
                shutdown.trigger();
            }
            _ = shutdown.cancelled() => {}
        }
    });

    info!("Starting pipeline...");
    let stats = pipeline.run().await.context("Pipeline execution failed")?;

    info!(
        tuples_emitted = stats.loop_stats.tuples_emitted,
        exit_reason = ?stats.loop_stats.exit_reason,
        duration_secs = stats.duration.as_secs_f64(),
        tps = format!("{:.2}", stats.tuples_per_second()),
        "Pipeline completed"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("Stream Syncer finished");
    Ok(())
}

/// Accepted range for `--sample-rate` (Hz)
const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<f64> = 0.001..=1_000_000.0;

/// Reject sample rates the synthetic sources cannot pace
fn check_sample_rate(rate: f64) -> Result<()> {
    if !SAMPLE_RATE_RANGE.contains(&rate) {
        anyhow::bail!(
            "--sample-rate must be within [{}, {}] Hz, got {}",
            SAMPLE_RATE_RANGE.start(),
            SAMPLE_RATE_RANGE.end(),
            rate
        );
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::SyncerConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Sources ({}):", config.source_count());
    for (index, source) in config.sources.iter().enumerate() {
        println!("  [{}] {} ({})", index, source.id, source.display_name());
    }

    let pacing = &config.pacing;
    println!("\nPacing:");
    println!(
        "  Delay: initial {} ms, range [{}, {}] ms",
        pacing.initial_delay_ms, pacing.min_delay_ms, pacing.max_delay_ms
    );
    println!(
        "  Watermarks: low {} / high {}",
        pacing.low_watermark, pacing.high_watermark
    );
    println!(
        "  Factors: decay {} / recovery {}",
        pacing.decay_factor, pacing.recovery_factor
    );

    println!("\nQueue:");
    println!(
        "  Capacity: {} ({:?})",
        config.queue.capacity, config.queue.overflow_policy
    );

    println!("\nSink: {} ({:?})", config.sink.name, config.sink.sink_type);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_sample_rate() {
        assert!(check_sample_rate(100.0).is_ok());
        assert!(check_sample_rate(0.001).is_ok());
        assert!(check_sample_rate(1_000_000.0).is_ok());

        for rate in [0.0, -1.0, 1e-20, 1e7, f64::NAN, f64::INFINITY] {
            assert!(check_sample_rate(rate).is_err(), "rate {rate}");
        }
    }
}
