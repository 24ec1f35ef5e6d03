//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{AttackingSide, PeriodBounds, SyncConfig};
use ingestion::MatchData;
use serde::Serialize;
use sync_engine::SyncEngine;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Match info for JSON output
#[derive(Serialize)]
struct MatchInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    match_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    label: String,
    pitch: PitchInfo,
    home_team: TeamSummary,
    away_team: TeamSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    home_team_side: Vec<AttackingSide>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    periods: Vec<PeriodBounds>,
}

#[derive(Serialize)]
struct PitchInfo {
    length: f64,
    width: f64,
}

#[derive(Serialize)]
struct TeamSummary {
    id: u64,
    name: String,
    roster_size: usize,
    starters: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    players: Vec<PlayerSummary>,
}

#[derive(Serialize)]
struct PlayerSummary {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    starting: bool,
}

/// Execute the `info` command
pub async fn run_info(args: &InfoArgs) -> Result<()> {
    info!(match_data = %args.match_data.display(), "Loading match info");

    if !args.match_data.is_file() {
        return Err(
            CliError::input_not_found("Match data", args.match_data.display().to_string()).into(),
        );
    }

    let content = ingestion::read_text(&args.match_data).await?;
    let match_data = MatchData::from_json(&content).context("Failed to load match data")?;

    let periods = match &args.tracking_data {
        Some(path) => tracked_periods(path).await?,
        None => Vec::new(),
    };

    let info = build_match_info(&match_data, periods, args.players);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize match info")?;
        println!("{}", json);
    } else {
        print_match_info(&info);
    }

    Ok(())
}

async fn tracked_periods(path: &std::path::Path) -> Result<Vec<PeriodBounds>> {
    let frames = ingestion::load_tracking(path)
        .await
        .context("Failed to load tracking data")?;
    let engine = SyncEngine::new(SyncConfig::default());
    let index = tokio::task::spawn_blocking(move || engine.index(frames))
        .await
        .map_err(|e| CliError::pipeline_execution(format!("indexing task failed: {e}")))??;
    Ok(index.periods().to_vec())
}

fn build_match_info(match_data: &MatchData, periods: Vec<PeriodBounds>, players: bool) -> MatchInfo {
    let team = |team: &ingestion::MatchTeam| {
        let roster: Vec<_> = match_data
            .players
            .iter()
            .filter(|p| p.team_id == team.id)
            .collect();
        let starting = |p: &ingestion::MatchPlayer| p.start_time.as_deref() == Some("00:00:00");
        TeamSummary {
            id: team.id,
            name: team
                .name
                .clone()
                .or_else(|| team.short_name.clone())
                .unwrap_or_else(|| team.id.to_string()),
            roster_size: roster.len(),
            starters: roster.iter().filter(|&&p| starting(p)).count(),
            players: if players {
                roster
                    .iter()
                    .map(|p| PlayerSummary {
                        id: p.id,
                        number: p.number,
                        name: p.short_name.clone(),
                        role: p.player_role.as_ref().and_then(|r| r.acronym.clone()),
                        starting: starting(*p),
                    })
                    .collect()
            } else {
                Vec::new()
            },
        }
    };

    MatchInfo {
        match_id: match_data.id,
        date_time: match_data.date_time.clone(),
        label: match_data.label(),
        pitch: PitchInfo {
            length: match_data.pitch_length,
            width: match_data.pitch_width,
        },
        home_team: team(&match_data.home_team),
        away_team: team(&match_data.away_team),
        home_team_side: match_data.home_team_side.clone().unwrap_or_default(),
        periods,
    }
}

fn print_match_info(info: &MatchInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                       Match Information                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🏟  {}", info.label);
    if let Some(id) = info.match_id {
        println!("   ├─ Match id: {}", id);
    }
    if let Some(ref date) = info.date_time {
        println!("   ├─ Kick-off: {}", date);
    }
    println!("   └─ Pitch: {} x {} m", info.pitch.length, info.pitch.width);

    for (label, team) in [("Home", &info.home_team), ("Away", &info.away_team)] {
        println!(
            "\n👕 {} - {} ({}): {} players, {} starting",
            label, team.name, team.id, team.roster_size, team.starters
        );
        for (i, player) in team.players.iter().enumerate() {
            let prefix = if i + 1 == team.players.len() { "└─" } else { "├─" };
            println!(
                "   {} #{} {} [{}]{}",
                prefix,
                player.number.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                player.name.as_deref().unwrap_or("?"),
                player.role.as_deref().unwrap_or("-"),
                if player.starting { "" } else { " (sub)" }
            );
        }
    }

    if !info.home_team_side.is_empty() {
        println!("\n➡  Home team side");
        for (i, side) in info.home_team_side.iter().enumerate() {
            println!("   period {}: {:?}", i + 1, side);
        }
    }

    if !info.periods.is_empty() {
        println!("\n⏱  Tracked periods");
        for (i, period) in info.periods.iter().enumerate() {
            let prefix = if i + 1 == info.periods.len() { "└─" } else { "├─" };
            println!(
                "   {} period {}: frames {}..={} ({} frames)",
                prefix,
                period.period,
                period.first_frame,
                period.last_frame,
                period.frame_count()
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::{MockMatch, MockMatchConfig};

    #[test]
    fn test_build_match_info() {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let info = build_match_info(&mock.match_data, Vec::new(), true);

        let total = mock.match_data.players.len();
        assert_eq!(info.home_team.roster_size + info.away_team.roster_size, total);
        assert_eq!(info.home_team.players.len(), info.home_team.roster_size);
        assert!(info.periods.is_empty());
    }

    #[tokio::test]
    async fn test_tracked_periods() {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracking.jsonl");
        std::fs::write(&path, mock.tracking_jsonl()).unwrap();

        let periods = tracked_periods(&path).await.unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].first_frame, 100);
        assert_eq!(periods[1].first_frame, 1000);
    }
}
