//! Canonical event model
//!
//! Every provider adapter produces the same `Event` shape. Once built, events
//! are never mutated; synchronization output lives in `SyncResult`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ProviderId;

/// Canonical player identifier (tracking space).
pub type PlayerId = u64;

/// Canonical team identifier (tracking space).
pub type TeamId = u64;

/// Event data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Wyscout,
    Opta,
    #[serde(rename = "statsbomb")]
    StatsBomb,
    Impect,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Wyscout,
        Provider::Opta,
        Provider::StatsBomb,
        Provider::Impect,
    ];

    /// Column prefix used in every output artifact (`{prefix}_event_id`, ...).
    pub fn prefix(&self) -> &'static str {
        match self {
            Provider::Wyscout => "wyscout",
            Provider::Opta => "opta",
            Provider::StatsBomb => "statsbomb",
            Provider::Impect => "impect",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.prefix().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown provider '{s}'"))
    }
}

/// Coarse event family driving refinement and offset sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pass,
    Shot,
    #[default]
    Other,
}

/// Point on the pitch in metres, origin at the centre spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub x: f64,
    pub y: f64,
}

impl PitchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Lineup metadata attached to an event's player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineupInfo {
    pub name: Option<String>,
    pub number: Option<u32>,
    pub role: Option<String>,
    pub starting: bool,
}

/// Canonical event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Provider event id
    pub id: ProviderId,
    /// Provider type name (e.g. "Pass", "game_interruption", "SHOT")
    pub type_name: String,
    pub kind: EventKind,
    /// Match period, 1..=4
    pub period: u8,
    /// Seconds since the period kick-off on the provider clock
    pub timestamp_s: f64,
    pub player_id: Option<PlayerId>,
    pub provider_player_id: Option<ProviderId>,
    pub team_id: Option<TeamId>,
    pub provider_team_id: Option<ProviderId>,
    /// Event location in tracking coordinates
    pub location: Option<PitchPoint>,
    /// Eligible for refinement when refinement is enabled
    pub to_refine: bool,
    /// Refined even when refinement is globally disabled
    pub force_refine: bool,
    /// Per-event refine window radius in frames
    pub refine_radius: Option<u32>,
    pub is_head: bool,
    /// False for administrative types with no ball-involving instant
    pub matchable: bool,
    pub lineup: Option<LineupInfo>,
}

impl Event {
    /// Minimal event with everything optional left unset.
    pub fn new(id: impl Into<ProviderId>, type_name: impl Into<String>, period: u8, timestamp_s: f64) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            kind: EventKind::Other,
            period,
            timestamp_s,
            player_id: None,
            provider_player_id: None,
            team_id: None,
            provider_team_id: None,
            location: None,
            to_refine: false,
            force_refine: false,
            refine_radius: None,
            is_head: false,
            matchable: true,
            lineup: None,
        }
    }

    /// Frame count between the period kick-off and this event on the provider clock.
    pub fn frames_since_kickoff(&self, frame_rate: f64) -> i64 {
        (self.timestamp_s * frame_rate).round() as i64
    }

    /// True when the provider attached a usable player reference.
    pub fn has_provider_player_id(&self) -> bool {
        self.provider_player_id
            .as_ref()
            .is_some_and(|id| !id.is_empty())
    }

    pub fn is_pass(&self) -> bool {
        self.kind == EventKind::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_prefix_roundtrip() {
        for provider in Provider::ALL {
            assert_eq!(provider.prefix().parse::<Provider>().unwrap(), provider);
        }
        assert_eq!("StatsBomb".parse::<Provider>().unwrap(), Provider::StatsBomb);
        assert!("tracab".parse::<Provider>().is_err());
    }

    #[test]
    fn test_frames_since_kickoff_rounds() {
        let event = Event::new("e1", "Pass", 1, 12.34);
        assert_eq!(event.frames_since_kickoff(10.0), 123);

        let event = Event::new("e2", "Pass", 1, 12.36);
        assert_eq!(event.frames_since_kickoff(10.0), 124);
    }

    #[test]
    fn test_provider_player_id_attachment() {
        let mut event = Event::new("e1", "Pass", 1, 0.0);
        assert!(!event.has_provider_player_id());

        event.provider_player_id = Some("".into());
        assert!(!event.has_provider_player_id());

        event.provider_player_id = Some(ProviderId::from(8_i64));
        assert!(event.has_provider_player_id());
    }
}
