//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Event Sync - aligns provider event data with SkillCorner tracking data
#[derive(Parser, Debug)]
#[command(
    name = "event-sync",
    author,
    version,
    about = "Synchronize football event data with tracking data",
    long_about = "Aligns a provider event feed (Wyscout, Opta, StatsBomb, Impect) with a \n\
                  SkillCorner tracking stream: estimates per-period clock offsets, refines \n\
                  pass and shot frames, validates player-ball proximity and writes \n\
                  per-event reports and freeze frames."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVENT_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVENT_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "EVENT_SYNC_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize a Wyscout event feed
    Wyscout(WyscoutArgs),

    /// Synchronize an Opta event feed
    Opta(LineupArgs),

    /// Synchronize a StatsBomb event feed
    #[command(name = "statsbomb")]
    StatsBomb(StatsBombArgs),

    /// Synchronize an Impect event feed
    Impect(LineupArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display match information
    Info(InfoArgs),
}

/// Arguments shared by every provider command
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// SkillCorner match metadata (JSON)
    #[arg(long)]
    pub match_data: PathBuf,

    /// SkillCorner tracking data (JSON Lines)
    #[arg(long)]
    pub tracking_data: PathBuf,

    /// Provider event file (JSON)
    #[arg(long)]
    pub events: PathBuf,

    /// Directory receiving the reports and freeze frames
    #[arg(short, long, default_value = ".", env = "EVENT_SYNC_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "EVENT_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep offset-implied frames for passes and shots
    #[arg(long)]
    pub no_refine: bool,

    /// Per-sink queue capacity
    #[arg(long, default_value = "4", env = "EVENT_SYNC_QUEUE_CAPACITY")]
    pub queue_capacity: usize,
}

/// Arguments for the `wyscout` command
#[derive(Args, Debug, Clone)]
pub struct WyscoutArgs {
    #[command(flatten)]
    pub sync: SyncArgs,
}

/// Arguments for providers that ship a separate lineup / match sheet
#[derive(Args, Debug, Clone)]
pub struct LineupArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Provider lineup or match sheet (JSON)
    #[arg(long)]
    pub lineup: PathBuf,
}

/// Arguments for the `statsbomb` command
#[derive(Args, Debug, Clone)]
pub struct StatsBombArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    /// StatsBomb lineup (JSON)
    #[arg(long)]
    pub lineup: PathBuf,

    /// StatsBomb id of the home team
    #[arg(long)]
    pub home_team_id: String,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// SkillCorner match metadata (JSON)
    #[arg(long)]
    pub match_data: PathBuf,

    /// Tracking data, to list period frame ranges
    #[arg(long)]
    pub tracking_data: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every roster entry
    #[arg(long)]
    pub players: bool,
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
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
