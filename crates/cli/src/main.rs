//! # Event Sync CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - One synchronization command per event provider
//! - Configuration validation
//! - Match metadata inspection

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_provider, run_validate, ProviderInput};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_observability(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Event Sync CLI starting");

    let result = match &cli.command {
        Commands::Wyscout(args) => run_provider(ProviderInput::Wyscout, &args.sync).await,
        Commands::Opta(args) => {
            run_provider(ProviderInput::Opta { lineup: &args.lineup }, &args.sync).await
        }
        Commands::StatsBomb(args) => {
            run_provider(
                ProviderInput::StatsBomb {
                    lineup: &args.lineup,
                    home_team_id: &args.home_team_id,
                },
                &args.sync,
            )
            .await
        }
        Commands::Impect(args) => {
            run_provider(ProviderInput::Impect { lineup: &args.lineup }, &args.sync).await
        }
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize tracing and the optional metrics endpoint from CLI options
fn init_observability(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: Some(cli.metrics_port).filter(|&p| p > 0),
        default_log_level: default_log_level.to_string(),
    })
}
