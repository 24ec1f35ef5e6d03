//! Provider commands: load inputs and run the synchronization pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::SyncConfig;
use ingestion::{
    EventAdapter, ImpectAdapter, MatchData, OptaAdapter, StatsBombAdapter, WyscoutAdapter,
};
use tracing::{info, warn};

use crate::cli::SyncArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Provider-specific inputs on top of the common arguments
#[derive(Debug, Clone, Copy)]
pub enum ProviderInput<'a> {
    Wyscout,
    Opta { lineup: &'a Path },
    StatsBomb { lineup: &'a Path, home_team_id: &'a str },
    Impect { lineup: &'a Path },
}

/// Execute one provider command
pub async fn run_provider(input: ProviderInput<'_>, args: &SyncArgs) -> Result<()> {
    check_inputs(input, args)?;

    let mut config = load_config(args)?;

    let match_json = ingestion::read_text(&args.match_data).await?;
    let match_data = MatchData::from_json(&match_json).context("Failed to load match data")?;
    let adapter = build_adapter(input, &args.events).await?;

    merge_non_matchable(&mut config, adapter.non_matchable_types());

    info!(
        provider = %adapter.provider(),
        frame_rate = config.frame_rate,
        refine = config.refine.enabled,
        non_matchable = config.non_matchable_types.len(),
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        sync: config,
        tracking_path: args.tracking_data.clone(),
        output_dir: args.output_dir.clone(),
        queue_capacity: args.queue_capacity,
    });

    tokio::select! {
        result = pipeline.run(adapter.as_ref(), match_data) => {
            let stats = result.context("Synchronization failed")?;
            stats.print_summary();
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, aborting run");
            return Err(CliError::pipeline_execution("interrupted").into());
        }
    }

    info!("Event Sync finished");
    Ok(())
}

fn check_inputs(input: ProviderInput<'_>, args: &SyncArgs) -> Result<(), CliError> {
    let mut required = vec![
        ("Match data", args.match_data.as_path()),
        ("Tracking data", args.tracking_data.as_path()),
        ("Event data", args.events.as_path()),
    ];
    match input {
        ProviderInput::Wyscout => {}
        ProviderInput::Opta { lineup }
        | ProviderInput::StatsBomb { lineup, .. }
        | ProviderInput::Impect { lineup } => required.push(("Lineup", lineup)),
    }

    for (name, path) in required {
        if !path.is_file() {
            return Err(CliError::input_not_found(name, path.display().to_string()));
        }
    }

    if args.output_dir.exists() && !args.output_dir.is_dir() {
        return Err(CliError::output_dir(
            args.output_dir.display().to_string(),
            "path exists and is not a directory",
        ));
    }
    Ok(())
}

/// Load the configuration file, or defaults, and apply CLI overrides
fn load_config(args: &SyncArgs) -> Result<SyncConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => SyncConfig::default(),
    };

    if args.no_refine {
        info!("Frame refinement disabled from CLI");
        config.refine.enabled = false;
    }
    Ok(config)
}

async fn build_adapter(input: ProviderInput<'_>, events: &Path) -> Result<Box<dyn EventAdapter>> {
    let events = ingestion::read_text(events).await?;
    let adapter: Box<dyn EventAdapter> = match input {
        ProviderInput::Wyscout => Box::new(WyscoutAdapter::from_json(&events)?),
        ProviderInput::Opta { lineup } => {
            let lineup = ingestion::read_text(lineup).await?;
            Box::new(OptaAdapter::from_json(&events, &lineup)?)
        }
        ProviderInput::StatsBomb {
            lineup,
            home_team_id,
        } => {
            let lineup = ingestion::read_text(lineup).await?;
            Box::new(StatsBombAdapter::from_json(&events, &lineup, home_team_id)?)
        }
        ProviderInput::Impect { lineup } => {
            let lineup = ingestion::read_text(lineup).await?;
            Box::new(ImpectAdapter::from_json(&events, &lineup)?)
        }
    };
    Ok(adapter)
}

/// Add the adapter's built-in non-matchable types to the configured ones
fn merge_non_matchable(config: &mut SyncConfig, builtin: &[&str]) {
    for name in builtin {
        if !config.is_non_matchable(name) {
            config.non_matchable_types.push((*name).to_string());
        }
    }
}
