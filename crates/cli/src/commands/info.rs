//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SyncerConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sources: Vec<SourceInfo>,
    sink: SinkInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    tuning: Option<TuningInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    index: usize,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Serialize)]
struct TuningInfo {
    pacing: contracts::PacingConfig,
    queue: contracts::QueueConfig,
    health: contracts::HealthConfig,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &SyncerConfig, args: &InfoArgs) -> ConfigInfo {
    let sources = config
        .sources
        .iter()
        .enumerate()
        .map(|(index, s)| SourceInfo {
            index,
            id: s.id.clone(),
            title: s.title.clone(),
        })
        .collect();

    let tuning = args.tuning.then(|| TuningInfo {
        pacing: config.pacing.clone(),
        queue: config.queue.clone(),
        health: config.health.clone(),
    });

    ConfigInfo {
        version: format!("{:?}", config.version),
        sources,
        sink: SinkInfo {
            name: config.sink.name.clone(),
            sink_type: format!("{:?}", config.sink.sink_type),
            path: config.sink.path.as_ref().map(|p| p.display().to_string()),
        },
        tuning,
    }
}

fn print_config_info(config: &SyncerConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Stream Syncer Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Sources
    println!("📡 Sources ({})", config.source_count());
    for (i, source) in config.sources.iter().enumerate() {
        let prefix = if i + 1 == config.source_count() { "└─" } else { "├─" };
        match &source.title {
            Some(title) => println!("   {} [{}] {} - {}", prefix, i, source.id, title),
            None => println!("   {} [{}] {}", prefix, i, source.id),
        }
    }

    if args.tuning {
        let pacing = &config.pacing;
        println!("\n⚙️  Pacing");
        println!("   ├─ Initial delay: {} ms", pacing.initial_delay_ms);
        println!(
            "   ├─ Delay range: [{}, {}] ms",
            pacing.min_delay_ms, pacing.max_delay_ms
        );
        println!(
            "   ├─ Watermarks: low {} / high {}",
            pacing.low_watermark, pacing.high_watermark
        );
        println!("   └─ Factors: decay {} / recovery {}", pacing.decay_factor, pacing.recovery_factor);

        println!("\n📦 Queue");
        println!("   ├─ Capacity: {}", config.queue.capacity);
        println!("   └─ Overflow policy: {:?}", config.queue.overflow_policy);

        println!("\n🩺 Health");
        println!("   ├─ Silence timeout: {} s", config.health.silence_timeout_s);
        println!("   └─ Check interval: {} ms", config.health.check_interval_ms);
    }

    // Sink
    println!("\n📤 Sink");
    match &config.sink.path {
        Some(path) => println!(
            "   └─ {} ({:?}, {})",
            config.sink.name,
            config.sink.sink_type,
            path.display()
        ),
        None => println!("   └─ {} ({:?})", config.sink.name, config.sink.sink_type),
    }

    println!();
}
