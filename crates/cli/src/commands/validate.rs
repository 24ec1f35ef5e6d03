//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SyncConfig;
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
    frame_rate: f64,
    max_tracking_span_s: f64,
    offset_search_radius_s: f64,
    offset_max_score_m: f64,
    refine_enabled: bool,
    refine_window_radius: u32,
    validation_window_radius: u32,
    validation_proximity_m: f64,
    non_matchable_types: Vec<String>,
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

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

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
                    frame_rate: config.frame_rate,
                    max_tracking_span_s: config.max_tracking_span_s,
                    offset_search_radius_s: config.offset.search_radius_s,
                    offset_max_score_m: config.offset.max_score_m,
                    refine_enabled: config.refine.enabled,
                    refine_window_radius: config.refine.window_radius,
                    validation_window_radius: config.validation.window_radius,
                    validation_proximity_m: config.validation.proximity_m,
                    non_matchable_types: config.non_matchable_types.clone(),
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
fn collect_warnings(config: &SyncConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.refine.enabled {
        warnings.push(
            "refine.enabled is false - passes and shots keep their offset-implied frame"
                .to_string(),
        );
    }

    if config.offset.max_sample_events > 0 {
        warnings.push(format!(
            "offset.max_sample_events is {} - offsets are estimated from a subset of events",
            config.offset.max_sample_events
        ));
    }

    if config.validation.proximity_m < config.refine.proximity_m {
        warnings.push(format!(
            "validation.proximity_m ({}) is tighter than refine.proximity_m ({})",
            config.validation.proximity_m, config.refine.proximity_m
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Frame rate: {} fps", summary.frame_rate);
            println!("  Max tracking span: {} s", summary.max_tracking_span_s);
            println!(
                "  Offset search: ±{} s, max score {} m",
                summary.offset_search_radius_s, summary.offset_max_score_m
            );
            println!(
                "  Refinement: {} (±{} frames)",
                if summary.refine_enabled { "on" } else { "off" },
                summary.refine_window_radius
            );
            println!(
                "  Validation: ±{} frames within {} m",
                summary.validation_window_radius, summary.validation_proximity_m
            );
            if !summary.non_matchable_types.is_empty() {
                println!("  Non-matchable types: {}", summary.non_matchable_types.join(", "));
            }
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
