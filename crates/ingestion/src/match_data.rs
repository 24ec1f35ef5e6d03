//! SkillCorner match metadata
//!
//! Raw match JSON as delivered alongside the tracking stream. Provider
//! adapters read the raw form (they need provider cross-references such as
//! `wyscout_id`); the engine only sees the derived `MatchContext`.

use contracts::{AttackingSide, MatchContext, PlayerId, ProviderId, RosterEntry, TeamId, TeamInfo};
use serde::Deserialize;

use crate::error::{IngestionError, Result};

/// Team block of the match JSON
#[derive(Debug, Clone, Deserialize)]
pub struct MatchTeam {
    pub id: TeamId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// Player role block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRole {
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Player block of the match JSON
#[derive(Debug, Clone, Deserialize)]
pub struct MatchPlayer {
    pub id: PlayerId,
    pub team_id: TeamId,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub player_role: Option<PlayerRole>,
    #[serde(default)]
    pub start_time: Option<String>,
    /// Cross-reference to the Wyscout player id, when the feed provides it
    #[serde(default)]
    pub wyscout_id: Option<ProviderId>,
}

/// Match metadata
#[derive(Debug, Clone, Deserialize)]
pub struct MatchData {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub date_time: Option<String>,
    pub home_team: MatchTeam,
    pub away_team: MatchTeam,
    pub players: Vec<MatchPlayer>,
    pub pitch_length: f64,
    pub pitch_width: f64,
    #[serde(default)]
    pub home_team_side: Option<Vec<AttackingSide>>,
}

impl MatchData {
    /// Parse the match JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        let data: MatchData = serde_json::from_str(content)
            .map_err(|e| IngestionError::parse_failed("match data", e.to_string()))?;
        data.check()?;
        Ok(data)
    }

    fn check(&self) -> Result<()> {
        if self.home_team.id == self.away_team.id {
            return Err(IngestionError::schema(
                "match data",
                "home and away team share the same id",
            ));
        }
        if !(self.pitch_length > 0.0 && self.pitch_width > 0.0) {
            return Err(IngestionError::schema(
                "match data",
                format!(
                    "pitch dimensions must be positive, got {}x{}",
                    self.pitch_length, self.pitch_width
                ),
            ));
        }
        if let Some(player) = self
            .players
            .iter()
            .find(|p| p.team_id != self.home_team.id && p.team_id != self.away_team.id)
        {
            return Err(IngestionError::schema(
                "match data",
                format!("player {} belongs to unknown team {}", player.id, player.team_id),
            ));
        }
        Ok(())
    }

    pub fn player(&self, id: PlayerId) -> Option<&MatchPlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn team_ids(&self) -> [TeamId; 2] {
        [self.home_team.id, self.away_team.id]
    }

    /// Human readable match label, "Home - Away".
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            team_name(&self.home_team),
            team_name(&self.away_team)
        )
    }

    /// Engine-facing context.
    pub fn to_context(&self, frame_rate: f64) -> MatchContext {
        MatchContext {
            match_id: self.id,
            home_team: team_info(&self.home_team),
            away_team: team_info(&self.away_team),
            roster: self
                .players
                .iter()
                .map(|p| RosterEntry {
                    id: p.id,
                    team_id: p.team_id,
                    number: p.number,
                    short_name: p.short_name.clone(),
                    role: p.player_role.as_ref().and_then(|r| r.acronym.clone()),
                    start_time: p.start_time.clone(),
                })
                .collect(),
            pitch_length: self.pitch_length,
            pitch_width: self.pitch_width,
            home_team_side: self.home_team_side.clone().unwrap_or_default(),
            frame_rate,
        }
    }
}

fn team_name(team: &MatchTeam) -> String {
    team.short_name
        .clone()
        .or_else(|| team.name.clone())
        .unwrap_or_else(|| team.id.to_string())
}

fn team_info(team: &MatchTeam) -> TeamInfo {
    TeamInfo {
        id: team.id,
        name: team.name.clone().unwrap_or_default(),
        short_name: team.short_name.clone(),
    }
}
