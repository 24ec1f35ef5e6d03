//! Impect adapter
//!
//! Game time is continuous across periods with fixed per-period origins.
//! Passes that directly follow a reception or a regain are always refined
//! with a wider window.

use contracts::{Event, EventKind, PitchPoint, Provider, ProviderId};
use serde::Deserialize;

use super::common::{number_of, LineupEntry, ProviderMapping, KNOWN_PERIODS};
use crate::adapter::EventAdapter;
use crate::error::{IngestionError, Result};
use crate::match_data::MatchData;

const NON_MATCHABLE: &[&str] = &["NO_VIDEO", "FINAL_WHISTLE", "KICK_OFF", "OUT"];
const FORCE_REFINE_AFTER: &[&str] = &["RECEPTION", "LOOSE_BALL_REGAIN", "INTERCEPTION"];
const REFINE_RADIUS: u32 = 5;
const FORCE_REFINE_RADIUS: u32 = 15;

/// Impect coordinates are expressed on a 105x68 pitch.
const PITCH_LENGTH: f64 = 105.0;
const PITCH_WIDTH: f64 = 68.0;

fn period_origin_s(period: u8) -> f64 {
    match period {
        2 => 10_000.0,
        3 => 20_000.0,
        4 => 23_333.33,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpectEvent {
    id: ProviderId,
    #[serde(default)]
    period_id: Option<i64>,
    game_time: ImpectGameTime,
    #[serde(default)]
    squad_id: Option<ProviderId>,
    #[serde(default)]
    player: Option<ImpectRef>,
    action_type: String,
    #[serde(default)]
    body_part: Option<String>,
    #[serde(default)]
    start: Option<ImpectStart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpectGameTime {
    game_time_in_sec: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ImpectRef {
    id: ProviderId,
}

#[derive(Debug, Clone, Deserialize)]
struct ImpectStart {
    #[serde(default)]
    coordinates: Option<ImpectCoordinates>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImpectCoordinates {
    #[serde(default)]
    x: serde_json::Value,
    #[serde(default)]
    y: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpectMatchSheet {
    squad_home: ImpectSquad,
    squad_away: ImpectSquad,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpectSquad {
    id: ProviderId,
    players: Vec<ImpectSquadPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpectSquadPlayer {
    id: ProviderId,
    #[serde(default)]
    shirt_number: Option<u32>,
}

impl ImpectEvent {
    fn period(&self) -> Option<u8> {
        let period = u8::try_from(self.period_id?).ok()?;
        KNOWN_PERIODS.contains(&period).then_some(period)
    }

    fn is_head(&self) -> bool {
        self.body_part.as_deref() == Some("HEAD")
    }

    fn location(&self, length: f64, width: f64) -> Option<PitchPoint> {
        let coords = self.start.as_ref()?.coordinates.as_ref()?;
        Some(PitchPoint::new(
            number_of(&coords.x)? * length / PITCH_LENGTH,
            number_of(&coords.y)? * width / PITCH_WIDTH,
        ))
    }
}

/// Impect event adapter
#[derive(Debug, Clone)]
pub struct ImpectAdapter {
    events: Vec<ImpectEvent>,
    match_sheet: ImpectMatchSheet,
}

impl ImpectAdapter {
    pub fn from_json(events: &str, match_sheet: &str) -> Result<Self> {
        let events = serde_json::from_str(events)
            .map_err(|e| IngestionError::parse_failed("impect events", e.to_string()))?;
        let match_sheet = serde_json::from_str(match_sheet)
            .map_err(|e| IngestionError::parse_failed("impect match sheet", e.to_string()))?;
        Ok(Self { events, match_sheet })
    }

    fn mapping(&self, match_data: &MatchData) -> ProviderMapping {
        let sheet = &self.match_sheet;
        let pairs = [
            (match_data.home_team.id, sheet.squad_home.id.clone()),
            (match_data.away_team.id, sheet.squad_away.id.clone()),
        ];
        let entries: Vec<LineupEntry> = [&sheet.squad_home, &sheet.squad_away]
            .into_iter()
            .flat_map(|squad| {
                squad.players.iter().map(move |p| LineupEntry {
                    player_id: p.id.clone(),
                    team_id: squad.id.clone(),
                    number: p.shirt_number,
                })
            })
            .collect();
        ProviderMapping::from_lineup(match_data, &pairs, &entries)
    }
}

impl EventAdapter for ImpectAdapter {
    fn provider(&self) -> Provider {
        Provider::Impect
    }

    fn non_matchable_types(&self) -> &'static [&'static str] {
        NON_MATCHABLE
    }

    fn standardize(&self, match_data: &MatchData) -> Result<Vec<Event>> {
        let mapping = self.mapping(match_data);
        let (length, width) = (match_data.pitch_length, match_data.pitch_width);

        let mut events = Vec::new();
        let mut previous: Option<&str> = None;
        for raw in &self.events {
            let Some(period) = raw.period() else {
                continue;
            };
            let timestamp_s = raw.game_time.game_time_in_sec - period_origin_s(period);

            let mut event = Event::new(raw.id.clone(), raw.action_type.clone(), period, timestamp_s);
            event.kind = match raw.action_type.as_str() {
                "PASS" => EventKind::Pass,
                "SHOT" => EventKind::Shot,
                _ => EventKind::Other,
            };
            event.provider_player_id = raw.player.as_ref().map(|p| p.id.clone());
            event.player_id = event.provider_player_id.as_ref().and_then(|p| mapping.player(p));
            event.provider_team_id = raw.squad_id.clone();
            event.team_id = event.provider_team_id.as_ref().and_then(|t| mapping.team(t));
            event.location = raw.location(length, width);
            event.is_head = raw.is_head();
            event.to_refine = matches!(event.kind, EventKind::Pass | EventKind::Shot);
            event.force_refine = event.kind == EventKind::Pass
                && previous.is_some_and(|p| FORCE_REFINE_AFTER.contains(&p))
                && !event.is_head;
            event.refine_radius = if event.force_refine {
                Some(FORCE_REFINE_RADIUS)
            } else {
                event.to_refine.then_some(REFINE_RADIUS)
            };
            event.matchable = !NON_MATCHABLE.contains(&raw.action_type.as_str());

            previous = Some(raw.action_type.as_str());
            events.push(event);
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_data::tests::sample;

    const EVENTS: &str = r#"[
        {"id": 1, "periodId": 1, "gameTime": {"gameTimeInSec": 0.0}, "squadId": 70,
         "player": null, "actionType": "KICK_OFF", "bodyPart": null, "start": null},
        {"id": 2, "periodId": 1, "gameTime": {"gameTimeInSec": 4.5}, "squadId": 70,
         "player": {"id": 700}, "actionType": "RECEPTION", "bodyPart": "FOOT",
         "start": {"coordinates": {"x": 0.0, "y": 0.0}}},
        {"id": 3, "periodId": 1, "gameTime": {"gameTimeInSec": 6.0}, "squadId": 70,
         "player": {"id": 700}, "actionType": "PASS", "bodyPart": "FOOT",
         "start": {"coordinates": {"x": 52.5, "y": -34.0}}},
        {"id": 4, "periodId": 2, "gameTime": {"gameTimeInSec": 10012.0}, "squadId": 80,
         "player": {"id": 800}, "actionType": "SHOT", "bodyPart": "HEAD",
         "start": {"coordinates": {"x": "bad", "y": 1.0}}},
        {"id": 5, "periodId": 5, "gameTime": {"gameTimeInSec": 30000.0}, "squadId": 80,
         "player": {"id": 800}, "actionType": "SHOT", "bodyPart": "FOOT", "start": null}
    ]"#;

    const MATCH_SHEET: &str = r#"{
        "squadHome": {"id": 70, "players": [{"id": 700, "shirtNumber": 9}]},
        "squadAway": {"id": 80, "players": [{"id": 800, "shirtNumber": 10}]}
    }"#;

    fn standardized() -> Vec<Event> {
        ImpectAdapter::from_json(EVENTS, MATCH_SHEET)
            .unwrap()
            .standardize(&sample())
            .unwrap()
    }

    #[test]
    fn test_periods_and_timestamps() {
        let events = standardized();
        assert_eq!(events.len(), 4);
        assert_eq!(events[2].timestamp_s, 6.0);
        assert!((events[3].timestamp_s - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_force_refine_after_reception() {
        let events = standardized();
        assert!(events[2].force_refine);
        assert_eq!(events[2].refine_radius, Some(FORCE_REFINE_RADIUS));
        assert!(!events[3].force_refine);
        assert!(events[3].is_head);
        assert_eq!(events[3].refine_radius, Some(REFINE_RADIUS));
        assert_eq!(events[1].refine_radius, None);
    }

    #[test]
    fn test_mapping_and_location() {
        let events = standardized();
        assert_eq!(events[0].player_id, None);
        assert!(!events[0].matchable);
        assert_eq!(events[2].player_id, Some(1));
        assert_eq!(events[2].team_id, Some(100));
        assert_eq!(events[3].player_id, Some(3));
        assert_eq!(events[2].location, Some(PitchPoint::new(52.5, -34.0)));
        assert_eq!(events[3].location, None);
    }
}
