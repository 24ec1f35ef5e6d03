//! Match context
//!
//! Static match metadata shared by every stage: teams, roster, pitch size,
//! frame rate and optional per-period attacking sides.

use serde::{Deserialize, Serialize};

use crate::{LineupInfo, PlayerId, TeamId};

/// Team metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// Home or away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamType {
    #[serde(rename = "home_team")]
    Home,
    #[serde(rename = "away_team")]
    Away,
}

impl TeamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamType::Home => "home_team",
            TeamType::Away => "away_team",
        }
    }
}

/// Roster entry for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub team_id: TeamId,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub short_name: Option<String>,
    /// Role acronym (e.g. "GK", "CB")
    #[serde(default)]
    pub role: Option<String>,
    /// Match clock time the player came on, `None` when unused
    #[serde(default)]
    pub start_time: Option<String>,
}

impl RosterEntry {
    pub fn is_starting(&self) -> bool {
        self.start_time.as_deref() == Some("00:00:00")
    }

    /// Played at least one minute of the match.
    pub fn took_part(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn lineup(&self) -> LineupInfo {
        LineupInfo {
            name: self.short_name.clone(),
            number: self.number,
            role: self.role.clone(),
            starting: self.is_starting(),
        }
    }
}

/// Attacking direction of a team during a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackingSide {
    LeftToRight,
    RightToLeft,
}

impl AttackingSide {
    pub fn flipped(self) -> Self {
        match self {
            AttackingSide::LeftToRight => AttackingSide::RightToLeft,
            AttackingSide::RightToLeft => AttackingSide::LeftToRight,
        }
    }
}

/// Match context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub match_id: Option<u64>,
    pub home_team: TeamInfo,
    pub away_team: TeamInfo,
    pub roster: Vec<RosterEntry>,
    pub pitch_length: f64,
    pub pitch_width: f64,
    /// Home team attacking side per period, index 0 = period 1
    #[serde(default)]
    pub home_team_side: Vec<AttackingSide>,
    pub frame_rate: f64,
}

impl MatchContext {
    pub fn player(&self, id: PlayerId) -> Option<&RosterEntry> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn team(&self, id: TeamId) -> Option<(&TeamInfo, TeamType)> {
        if self.home_team.id == id {
            Some((&self.home_team, TeamType::Home))
        } else if self.away_team.id == id {
            Some((&self.away_team, TeamType::Away))
        } else {
            None
        }
    }

    pub fn team_of(&self, player_id: PlayerId) -> Option<TeamId> {
        self.player(player_id).map(|p| p.team_id)
    }

    /// Players that appear in the tracking stream.
    pub fn active_players(&self) -> impl Iterator<Item = &RosterEntry> {
        self.roster.iter().filter(|p| p.took_part())
    }

    /// Attacking side from match metadata, if provided for that period.
    pub fn declared_side(&self, team_id: TeamId, period: u8) -> Option<AttackingSide> {
        let home_side = *self.home_team_side.get(usize::from(period).checked_sub(1)?)?;
        match self.team(team_id)?.1 {
            TeamType::Home => Some(home_side),
            TeamType::Away => Some(home_side.flipped()),
        }
    }
}
