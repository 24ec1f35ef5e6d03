//! Opta adapter
//!
//! Reads the F24-style JSON feed (`liveData.event`) together with the match
//! sheet (`matchInfo.contestant`, `liveData.lineUp`). Timestamps are wall
//! clock; each period is anchored on its `Start` event.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use contracts::{Event, EventKind, PitchPoint, Provider, ProviderId};
use serde::Deserialize;
use tracing::warn;

use super::common::{de_opt_f64_lenient, parse_iso_datetime, LineupEntry, ProviderMapping, KNOWN_PERIODS};
use crate::adapter::EventAdapter;
use crate::error::{IngestionError, Result};
use crate::match_data::MatchData;

const START_PERIOD_TYPE_ID: u32 = 32;
const TEAM_SET_UP_TYPE_ID: u32 = 34;
const PASS_TYPE_IDS: &[u32] = &[1, 2];
const SHOT_TYPE_IDS: &[u32] = &[13, 14, 15, 16];
const REFINE_RADIUS: u32 = 10;

const NON_MATCHABLE: &[&str] = &[
    "Start",
    "Start delay",
    "End delay",
    "End",
    "Team set up",
    "Formation change",
    "Deleted event",
    "Player off",
    "Player on",
    "Player changed position",
    "Player changed Jersey",
    "Player retired",
    "Player returns",
    "Player becomes goalkeeper",
    "Goalkeeper becomes player",
    "Official change",
    "Condition change",
    "Collection End",
    "Temp_Goal",
    "Temp_Attempt",
    "Resume",
    "Contentious referee decision",
    "Card Bookings",
];

/// Opta event type name
fn type_name(type_id: u32) -> &'static str {
    match type_id {
        1 => "Pass",
        2 => "Offside Pass",
        3 => "Take On",
        4 => "Foul",
        5 => "Out",
        6 => "Corner Awarded",
        7 => "Tackle",
        8 => "Interception",
        10 => "Save Goalkeeper",
        11 => "Claim Goalkeeper",
        12 => "Clearance",
        13 => "Miss",
        14 => "Post",
        15 => "Attempt Saved",
        16 => "Goal",
        17 => "Card Bookings",
        18 => "Player off",
        19 => "Player on",
        20 => "Player retired",
        21 => "Player returns",
        22 => "Player becomes goalkeeper",
        23 => "Goalkeeper becomes player",
        24 => "Condition change",
        25 => "Official change",
        27 => "Start delay",
        28 => "End delay",
        30 => "End",
        32 => "Start",
        34 => "Team set up",
        35 => "Player changed position",
        36 => "Player changed Jersey",
        37 => "Collection End",
        38 => "Temp_Goal",
        39 => "Temp_Attempt",
        40 => "Formation change",
        41 => "Punch",
        42 => "Good Skill",
        43 => "Deleted event",
        44 => "Aerial",
        45 => "Challenge",
        47 => "Rescinded card",
        49 => "Ball recovery",
        50 => "Dispossessed",
        51 => "Error",
        52 => "Keeper pick-up",
        53 => "Cross not claimed",
        54 => "Smother",
        55 => "Offside provoked",
        56 => "Shield ball opp",
        57 => "Foul throw-in",
        58 => "Penalty faced",
        59 => "Keeper Sweeper",
        60 => "Chance missed",
        61 => "Ball touch",
        63 => "Temp_Save",
        64 => "Resume",
        65 => "Contentious referee decision",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptaEventsDocument {
    live_data: OptaEventsLiveData,
}

#[derive(Debug, Clone, Deserialize)]
struct OptaEventsLiveData {
    event: Vec<OptaEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptaEvent {
    id: ProviderId,
    type_id: u32,
    period_id: u8,
    time_stamp: String,
    #[serde(default)]
    contestant_id: Option<ProviderId>,
    #[serde(default)]
    player_id: Option<ProviderId>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    y: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptaMatchDocument {
    match_info: OptaMatchInfo,
    live_data: OptaMatchLiveData,
}

#[derive(Debug, Clone, Deserialize)]
struct OptaMatchInfo {
    contestant: Vec<OptaContestant>,
}

#[derive(Debug, Clone, Deserialize)]
struct OptaContestant {
    id: ProviderId,
    position: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptaMatchLiveData {
    line_up: Vec<OptaTeamLineup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptaTeamLineup {
    contestant_id: ProviderId,
    player: Vec<OptaLineupPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptaLineupPlayer {
    player_id: ProviderId,
    #[serde(default)]
    shirt_number: Option<u32>,
}

/// Opta event adapter
#[derive(Debug, Clone)]
pub struct OptaAdapter {
    events: Vec<OptaEvent>,
    match_sheet: OptaMatchDocument,
}

impl OptaAdapter {
    pub fn from_json(events: &str, match_sheet: &str) -> Result<Self> {
        let events: OptaEventsDocument = serde_json::from_str(events)
            .map_err(|e| IngestionError::parse_failed("opta events", e.to_string()))?;
        let match_sheet = serde_json::from_str(match_sheet)
            .map_err(|e| IngestionError::parse_failed("opta match sheet", e.to_string()))?;
        Ok(Self {
            events: events.live_data.event,
            match_sheet,
        })
    }

    fn contestant(&self, position: &str) -> Result<ProviderId> {
        self.match_sheet
            .match_info
            .contestant
            .iter()
            .find(|c| c.position.eq_ignore_ascii_case(position))
            .map(|c| c.id.clone())
            .ok_or_else(|| {
                IngestionError::schema("opta match sheet", format!("no {position} contestant"))
            })
    }

    fn mapping(&self, match_data: &MatchData) -> Result<ProviderMapping> {
        let pairs = [
            (match_data.home_team.id, self.contestant("home")?),
            (match_data.away_team.id, self.contestant("away")?),
        ];
        let entries: Vec<LineupEntry> = self
            .match_sheet
            .live_data
            .line_up
            .iter()
            .flat_map(|team| {
                team.player.iter().map(move |p| LineupEntry {
                    player_id: p.player_id.clone(),
                    team_id: team.contestant_id.clone(),
                    number: p.shirt_number,
                })
            })
            .collect();
        Ok(ProviderMapping::from_lineup(match_data, &pairs, &entries))
    }

    fn is_kept(event: &OptaEvent) -> bool {
        event.type_id != TEAM_SET_UP_TYPE_ID && KNOWN_PERIODS.contains(&event.period_id)
    }

    fn parse_time(event: &OptaEvent) -> Result<NaiveDateTime> {
        parse_iso_datetime(&event.time_stamp).ok_or_else(|| {
            IngestionError::parse_failed(
                "opta events",
                format!("event {}: invalid timeStamp '{}'", event.id, event.time_stamp),
            )
        })
    }

    /// Wall-clock kick-off of each period.
    fn period_starts(&self) -> Result<BTreeMap<u8, NaiveDateTime>> {
        let mut starts = BTreeMap::new();
        let mut earliest: BTreeMap<u8, NaiveDateTime> = BTreeMap::new();

        for event in self.events.iter().filter(|e| Self::is_kept(e)) {
            let time = Self::parse_time(event)?;
            if event.type_id == START_PERIOD_TYPE_ID {
                starts.entry(event.period_id).or_insert(time);
            }
            earliest
                .entry(event.period_id)
                .and_modify(|t| *t = (*t).min(time))
                .or_insert(time);
        }

        for (period, time) in earliest {
            starts.entry(period).or_insert_with(|| {
                warn!(period, "no Start event, anchoring period on its earliest event");
                time
            });
        }
        Ok(starts)
    }
}

impl EventAdapter for OptaAdapter {
    fn provider(&self) -> Provider {
        Provider::Opta
    }

    fn non_matchable_types(&self) -> &'static [&'static str] {
        NON_MATCHABLE
    }

    fn standardize(&self, match_data: &MatchData) -> Result<Vec<Event>> {
        let mapping = self.mapping(match_data)?;
        let starts = self.period_starts()?;
        let (length, width) = (match_data.pitch_length, match_data.pitch_width);

        let roster_team: HashMap<u64, u64> =
            match_data.players.iter().map(|p| (p.id, p.team_id)).collect();

        let mut events = Vec::new();
        for raw in self.events.iter().filter(|e| Self::is_kept(e)) {
            let time = Self::parse_time(raw)?;
            let start = starts.get(&raw.period_id).copied().unwrap_or(time);
            let timestamp_s = (time - start).num_milliseconds() as f64 / 1000.0;
            let name = type_name(raw.type_id);

            let mut event = Event::new(raw.id.clone(), name, raw.period_id, timestamp_s);
            event.kind = if PASS_TYPE_IDS.contains(&raw.type_id) {
                EventKind::Pass
            } else if SHOT_TYPE_IDS.contains(&raw.type_id) {
                EventKind::Shot
            } else {
                EventKind::Other
            };
            event.provider_player_id = raw.player_id.clone().filter(|p| !p.is_empty());
            event.player_id = event.provider_player_id.as_ref().and_then(|p| mapping.player(p));
            let player_id = event.player_id;
            event.provider_team_id = raw.contestant_id.clone().or_else(|| {
                let team = roster_team.get(&player_id?)?;
                mapping.provider_team(*team).cloned()
            });
            event.team_id = event.provider_team_id.as_ref().and_then(|t| mapping.team(t));
            event.location = match (raw.x, raw.y) {
                (Some(x), Some(y)) => Some(PitchPoint::new(
                    (x - 50.0) * length / 100.0,
                    (y - 50.0) * width / 100.0,
                )),
                _ => None,
            };
            event.to_refine = matches!(event.kind, EventKind::Pass | EventKind::Shot);
            event.refine_radius = event.to_refine.then_some(REFINE_RADIUS);
            event.matchable = !NON_MATCHABLE.contains(&name);
            events.push(event);
        }

        Ok(events)
    }
}
