//! StatsBomb adapter
//!
//! Events are a JSON list; the lineup file pairs StatsBomb players with
//! shirt numbers. The caller names the StatsBomb id of the home team.

use contracts::{Event, EventKind, PitchPoint, Provider, ProviderId};
use serde::Deserialize;

use super::common::{clock_seconds, LineupEntry, ProviderMapping, KNOWN_PERIODS};
use crate::adapter::EventAdapter;
use crate::error::{IngestionError, Result};
use crate::match_data::MatchData;

const NON_MATCHABLE: &[&str] = &[
    "Tactical Shift",
    "Substitution",
    "Referee Ball-Drop",
    "Player Off",
    "Player On",
    "Injury Stoppage",
    "Half End",
    "Half Start",
    "Starting XI",
];
const REFINE_RADIUS: u32 = 5;
const PASS_TYPE_ID: u32 = 30;
const SHOT_TYPE_ID: u32 = 16;

const PITCH_LENGTH: f64 = 120.0;
const PITCH_WIDTH: f64 = 80.0;

#[derive(Debug, Clone, Deserialize)]
struct StatsBombEvent {
    id: ProviderId,
    period: u8,
    timestamp: String,
    #[serde(rename = "type")]
    kind: StatsBombRef,
    #[serde(default)]
    team: Option<StatsBombRef>,
    #[serde(default)]
    player: Option<StatsBombRef>,
    #[serde(default)]
    location: Option<Vec<f64>>,
    #[serde(default)]
    pass: Option<StatsBombDetail>,
    #[serde(default)]
    shot: Option<StatsBombDetail>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatsBombRef {
    id: ProviderId,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatsBombDetail {
    #[serde(default)]
    body_part: Option<StatsBombRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatsBombLineup {
    team_id: ProviderId,
    lineup: Vec<StatsBombLineupPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatsBombLineupPlayer {
    player_id: ProviderId,
    #[serde(default)]
    jersey_number: Option<u32>,
    #[serde(default)]
    positions: Option<Vec<serde_json::Value>>,
}

impl StatsBombEvent {
    fn type_id(&self) -> Option<u32> {
        self.kind.id.as_str().parse().ok()
    }

    fn event_kind(&self) -> EventKind {
        match self.type_id() {
            Some(PASS_TYPE_ID) => EventKind::Pass,
            Some(SHOT_TYPE_ID) => EventKind::Shot,
            _ => EventKind::Other,
        }
    }

    fn is_head(&self) -> bool {
        [&self.pass, &self.shot]
            .into_iter()
            .flatten()
            .filter_map(|d| d.body_part.as_ref()?.name.as_deref())
            .any(|name| name == "Head")
    }
}

/// StatsBomb event adapter
#[derive(Debug, Clone)]
pub struct StatsBombAdapter {
    events: Vec<StatsBombEvent>,
    lineup: Vec<StatsBombLineup>,
    home_team_id: ProviderId,
}

impl StatsBombAdapter {
    pub fn from_json(events: &str, lineup: &str, home_team_id: impl Into<ProviderId>) -> Result<Self> {
        let events = serde_json::from_str(events)
            .map_err(|e| IngestionError::parse_failed("statsbomb events", e.to_string()))?;
        let lineup = serde_json::from_str(lineup)
            .map_err(|e| IngestionError::parse_failed("statsbomb lineup", e.to_string()))?;
        Ok(Self {
            events,
            lineup,
            home_team_id: home_team_id.into(),
        })
    }

    fn mapping(&self, match_data: &MatchData) -> Result<ProviderMapping> {
        if !self.lineup.iter().any(|t| t.team_id == self.home_team_id) {
            return Err(IngestionError::schema(
                "statsbomb lineup",
                format!("home team {} not found in lineup", self.home_team_id),
            ));
        }
        let away = self
            .lineup
            .iter()
            .find(|t| t.team_id != self.home_team_id)
            .ok_or_else(|| IngestionError::schema("statsbomb lineup", "away team not found in lineup"))?;

        let pairs = [
            (match_data.home_team.id, self.home_team_id.clone()),
            (match_data.away_team.id, away.team_id.clone()),
        ];

        // Players without positions never took the pitch; the filter only
        // applies when the feed carries positions for everyone.
        let all_have_positions = self
            .lineup
            .iter()
            .flat_map(|t| &t.lineup)
            .all(|p| p.positions.is_some());

        let entries: Vec<LineupEntry> = self
            .lineup
            .iter()
            .flat_map(|team| team.lineup.iter().map(move |p| (team, p)))
            .filter(|(_, p)| {
                !all_have_positions || p.positions.as_ref().is_some_and(|v| !v.is_empty())
            })
            .map(|(team, p)| LineupEntry {
                player_id: p.player_id.clone(),
                team_id: team.team_id.clone(),
                number: p.jersey_number,
            })
            .collect();

        Ok(ProviderMapping::from_lineup(match_data, &pairs, &entries))
    }
}

impl EventAdapter for StatsBombAdapter {
    fn provider(&self) -> Provider {
        Provider::StatsBomb
    }

    fn non_matchable_types(&self) -> &'static [&'static str] {
        NON_MATCHABLE
    }

    fn standardize(&self, match_data: &MatchData) -> Result<Vec<Event>> {
        let mapping = self.mapping(match_data)?;
        let (length, width) = (match_data.pitch_length, match_data.pitch_width);

        self.events
            .iter()
            .filter(|raw| KNOWN_PERIODS.contains(&raw.period))
            .map(|raw| {
                let timestamp_s = clock_seconds(&raw.timestamp).ok_or_else(|| {
                    IngestionError::parse_failed(
                        "statsbomb events",
                        format!("event {}: invalid timestamp '{}'", raw.id, raw.timestamp),
                    )
                })?;
                let type_name = raw.kind.name.clone().unwrap_or_default();

                let mut event = Event::new(raw.id.clone(), type_name, raw.period, timestamp_s);
                event.kind = raw.event_kind();
                event.provider_player_id = raw.player.as_ref().map(|p| p.id.clone());
                event.player_id = event.provider_player_id.as_ref().and_then(|p| mapping.player(p));
                event.provider_team_id = raw.team.as_ref().map(|t| t.id.clone());
                event.team_id = event.provider_team_id.as_ref().and_then(|t| mapping.team(t));
                event.location = match raw.location.as_deref() {
                    Some([x, y, ..]) => Some(PitchPoint::new(
                        (x - PITCH_LENGTH / 2.0) * length / PITCH_LENGTH,
                        -(y - PITCH_WIDTH / 2.0) * width / PITCH_WIDTH,
                    )),
                    _ => None,
                };
                event.to_refine = matches!(event.kind, EventKind::Pass | EventKind::Shot);
                event.refine_radius = event.to_refine.then_some(REFINE_RADIUS);
                event.is_head = raw.is_head();
                event.matchable = !NON_MATCHABLE.contains(&event.type_name.as_str());
                Ok(event)
            })
            .collect()
    }
}
