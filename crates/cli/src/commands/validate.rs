//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{OverflowPolicy, SyncerConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    source_count: usize,
    queue_capacity: usize,
    overflow_policy: String,
    sink: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    source_count: config.source_count(),
                    queue_capacity: config.queue.capacity,
                    overflow_policy: format!("{:?}", config.queue.overflow_policy),
                    sink: format!("{} ({:?})", config.sink.name, config.sink.sink_type),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SyncerConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let pacing = &config.pacing;

    if config.source_count() == 1 {
        warnings.push("Only one source configured - tuples carry a single sample".to_string());
    }

    if pacing.recovery_factor == 1.0 {
        warnings.push(
            "pacing.recovery_factor is 1.0 - delay never grows back once decayed".to_string(),
        );
    }

    if pacing.initial_delay_ms < pacing.min_delay_ms || pacing.initial_delay_ms > pacing.max_delay_ms
    {
        warnings.push(format!(
            "pacing.initial_delay_ms ({}) outside [{}, {}] - it will be clamped",
            pacing.initial_delay_ms, pacing.min_delay_ms, pacing.max_delay_ms
        ));
    }

    // Backlog can never exceed N * capacity
    let max_backlog = config.queue.capacity.saturating_mul(config.source_count());
    if max_backlog <= pacing.high_watermark {
        warnings.push(format!(
            "high_watermark ({}) is unreachable with capacity {} x {} sources - delay never decays",
            pacing.high_watermark,
            config.queue.capacity,
            config.source_count()
        ));
    }

    if config.queue.overflow_policy == OverflowPolicy::Reject {
        warnings.push(
            "queue.overflow_policy = reject - producers receive errors once a queue is full"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sources: {}", summary.source_count);
            println!(
                "  Queue: {} ({})",
                summary.queue_capacity, summary.overflow_policy
            );
            println!("  Sink: {}", summary.sink);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_have_no_warnings() {
        let config = SyncerConfig::with_sources(["HHE", "HHN", "HHZ"]);
        assert!(collect_warnings(&config).is_empty());
    }

    #[test]
    fn test_warnings() {
        let mut config = SyncerConfig::with_sources(["only"]);
        config.pacing.recovery_factor = 1.0;
        config.queue.capacity = 100;
        config.queue.overflow_policy = OverflowPolicy::Reject;

        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 4);
        assert!(warnings.iter().any(|w| w.contains("unreachable")));
    }

    #[test]
    fn test_validate_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[[sources]]\nid = \"a\"\n\n[[sources]]\nid = \"b\"").unwrap();

        let ok = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(ok.valid);
        assert_eq!(ok.summary.unwrap().source_count, 2);

        let missing = validate_config(&ValidateArgs {
            config: "/nonexistent/syncer.toml".into(),
            json: false,
        });
        assert!(!missing.valid);
        assert!(missing.error.unwrap().contains("File not found"));
    }
}
