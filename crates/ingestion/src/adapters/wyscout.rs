//! Wyscout adapter
//!
//! Reads the v3 events document (`{"events": [...]}`). Player ids resolve
//! through the `wyscout_id` cross-reference carried by the match roster.

use std::collections::{BTreeMap, HashMap};

use contracts::{Event, EventKind, PitchPoint, Provider, ProviderId};
use serde::Deserialize;
use tracing::{debug, warn};

use super::common::{clock_seconds, de_f64_lenient, ProviderMapping};
use crate::adapter::EventAdapter;
use crate::error::{IngestionError, Result};
use crate::match_data::MatchData;

const NON_MATCHABLE: &[&str] = &["game_interruption"];
const REFINE_RADIUS: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
struct WyscoutDocument {
    events: Vec<WyscoutEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WyscoutEvent {
    id: ProviderId,
    match_period: String,
    #[serde(default)]
    match_timestamp: Option<String>,
    #[serde(deserialize_with = "de_f64_lenient")]
    video_timestamp: f64,
    #[serde(rename = "type")]
    kind: WyscoutType,
    #[serde(default)]
    location: Option<WyscoutLocation>,
    #[serde(default)]
    team: Option<WyscoutRef>,
    #[serde(default)]
    player: Option<WyscoutRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct WyscoutType {
    primary: String,
    #[serde(default)]
    secondary: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct WyscoutLocation {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct WyscoutRef {
    id: ProviderId,
}

impl WyscoutEvent {
    fn period(&self) -> Option<u8> {
        match self.match_period.as_str() {
            "1H" => Some(1),
            "2H" => Some(2),
            "1E" => Some(3),
            "2E" => Some(4),
            _ => None,
        }
    }

    fn kind(&self) -> EventKind {
        let t = &self.kind;
        if t.primary == "pass"
            || (t.primary == "interception"
                && t.secondary.iter().any(|s| s == "pass" || s == "head_pass"))
        {
            EventKind::Pass
        } else if t.primary == "shot" {
            EventKind::Shot
        } else {
            EventKind::Other
        }
    }

    fn is_head(&self) -> bool {
        self.kind
            .secondary
            .iter()
            .any(|s| s == "head_pass" || s == "head_shot")
    }

    /// Wyscout encodes "no player" as id 0.
    fn player_id(&self) -> Option<&ProviderId> {
        self.player
            .as_ref()
            .map(|p| &p.id)
            .filter(|id| !id.is_empty() && id.as_str() != "0")
    }
}

/// Minute at which each period's match clock starts.
fn period_start_minute(period: u8) -> f64 {
    match period {
        2 => 45.0,
        3 => 90.0,
        4 => 105.0,
        _ => 0.0,
    }
}

/// Wyscout event adapter
#[derive(Debug, Clone)]
pub struct WyscoutAdapter {
    events: Vec<WyscoutEvent>,
}

impl WyscoutAdapter {
    pub fn from_json(content: &str) -> Result<Self> {
        let doc: WyscoutDocument = serde_json::from_str(content)
            .map_err(|e| IngestionError::parse_failed("wyscout events", e.to_string()))?;
        Ok(Self { events: doc.events })
    }

    fn mapping(&self, match_data: &MatchData) -> ProviderMapping {
        let players: HashMap<ProviderId, u64> = match_data
            .players
            .iter()
            .filter_map(|p| Some((p.wyscout_id.clone()?, p.id)))
            .filter(|(wy, _)| wy.as_str() != "0")
            .collect();

        let mut teams = HashMap::new();
        for event in &self.events {
            if teams.len() == 2 {
                break;
            }
            let (Some(team), Some(player)) = (event.team.as_ref(), event.player_id()) else {
                continue;
            };
            if teams.contains_key(&team.id) {
                continue;
            }
            if let Some(skc) = players.get(player).and_then(|id| match_data.player(*id)) {
                teams.insert(team.id.clone(), skc.team_id);
            }
        }

        ProviderMapping::from_parts(teams, players)
    }

    /// Seconds since the period kick-off for each kept event.
    ///
    /// The match clock is used unless any value is negative, in which case the
    /// video clock takes over. Each period is then shifted so its first event
    /// (in video order) sits at zero.
    fn period_relative_times(&self, kept: &[(&WyscoutEvent, u8)]) -> Vec<f64> {
        let match_clock: Option<Vec<f64>> = kept
            .iter()
            .map(|(e, period)| {
                let raw = e.match_timestamp.as_deref()?;
                if raw.contains('-') {
                    return None;
                }
                Some(clock_seconds(raw)? - period_start_minute(*period) * 60.0)
            })
            .collect();

        let times = match match_clock {
            Some(times) => times,
            None => {
                debug!("falling back to wyscout video timestamps");
                kept.iter().map(|(e, _)| e.video_timestamp).collect()
            }
        };

        let mut first: BTreeMap<u8, (f64, f64)> = BTreeMap::new();
        for ((event, period), time) in kept.iter().zip(&times) {
            let entry = first
                .entry(*period)
                .or_insert((event.video_timestamp, *time));
            if event.video_timestamp < entry.0 {
                *entry = (event.video_timestamp, *time);
            }
        }

        kept.iter()
            .zip(times)
            .map(|((_, period), time)| time - first.get(period).map_or(0.0, |(_, t0)| *t0))
            .collect()
    }
}

impl EventAdapter for WyscoutAdapter {
    fn provider(&self) -> Provider {
        Provider::Wyscout
    }

    fn non_matchable_types(&self) -> &'static [&'static str] {
        NON_MATCHABLE
    }

    fn standardize(&self, match_data: &MatchData) -> Result<Vec<Event>> {
        let mapping = self.mapping(match_data);
        if mapping.mapped_players() == 0 {
            warn!("no roster player carries a wyscout_id, events will not map to players");
        }

        let kept: Vec<(&WyscoutEvent, u8)> = self
            .events
            .iter()
            .filter_map(|e| Some((e, e.period()?)))
            .collect();
        let times = self.period_relative_times(&kept);

        let (length, width) = (match_data.pitch_length, match_data.pitch_width);
        let events = kept
            .into_iter()
            .zip(times)
            .map(|((raw, period), timestamp_s)| {
                let mut event = Event::new(raw.id.clone(), raw.kind.primary.clone(), period, timestamp_s);
                event.kind = raw.kind();
                event.provider_player_id = raw.player_id().cloned();
                event.player_id = event.provider_player_id.as_ref().and_then(|p| mapping.player(p));
                event.provider_team_id = raw.team.as_ref().map(|t| t.id.clone());
                event.team_id = event.provider_team_id.as_ref().and_then(|t| mapping.team(t));
                event.location = raw.location.map(|l| {
                    PitchPoint::new(
                        (l.x - 50.0) * length / 100.0,
                        -(l.y - 50.0) * width / 100.0,
                    )
                });
                event.to_refine = matches!(event.kind, EventKind::Pass | EventKind::Shot);
                event.refine_radius = event.to_refine.then_some(REFINE_RADIUS);
                event.is_head = raw.is_head();
                event.matchable = !NON_MATCHABLE.contains(&raw.kind.primary.as_str());
                event
            })
            .collect();

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_data::tests::sample;

    const EVENTS: &str = r#"{"events": [
        {"id": 11, "matchPeriod": "1H", "matchTimestamp": "00:00:01.000", "videoTimestamp": "5.0",
         "type": {"primary": "pass", "secondary": []}, "location": {"x": 50, "y": 50},
         "team": {"id": 7}, "player": {"id": 9001}},
        {"id": 12, "matchPeriod": "1H", "matchTimestamp": "00:00:03.500", "videoTimestamp": "7.5",
         "type": {"primary": "interception", "secondary": ["head_pass"]}, "location": {"x": 75, "y": 25},
         "team": {"id": 8}, "player": {"id": 9003}},
        {"id": 13, "matchPeriod": "1H", "matchTimestamp": "00:00:05.000", "videoTimestamp": 9.0,
         "type": {"primary": "game_interruption", "secondary": []}, "location": null,
         "team": {"id": 7}, "player": {"id": 0}},
        {"id": 21, "matchPeriod": "2H", "matchTimestamp": "00:45:02.000", "videoTimestamp": "3000.0",
         "type": {"primary": "shot", "secondary": ["head_shot"]}, "location": {"x": 90, "y": 50},
         "team": {"id": 8}, "player": {"id": 4242}},
        {"id": 31, "matchPeriod": "P", "matchTimestamp": "02:00:00.000", "videoTimestamp": "9000",
         "type": {"primary": "shot", "secondary": []}, "location": null,
         "team": {"id": 7}, "player": {"id": 9001}}
    ]}"#;

    fn standardized() -> Vec<Event> {
        WyscoutAdapter::from_json(EVENTS)
            .unwrap()
            .standardize(&sample())
            .unwrap()
    }

    #[test]
    fn test_penalty_shootout_dropped() {
        let events = standardized();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.period <= 2));
    }

    #[test]
    fn test_timestamps_relative_to_first_period_event() {
        let events = standardized();
        assert!((events[0].timestamp_s - 0.0).abs() < 1e-9);
        assert!((events[1].timestamp_s - 2.5).abs() < 1e-9);
        assert!((events[3].timestamp_s - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_video_clock_used_when_match_clock_negative() {
        let json = EVENTS.replace("00:00:01.000", "-00:00:01.000");
        let events = WyscoutAdapter::from_json(&json)
            .unwrap()
            .standardize(&sample())
            .unwrap();
        assert!((events[1].timestamp_s - 2.5).abs() < 1e-9);
        assert!((events[2].timestamp_s - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_player_and_team_mapping() {
        let events = standardized();
        assert_eq!(events[0].player_id, Some(1));
        assert_eq!(events[0].team_id, Some(100));
        assert_eq!(events[1].player_id, Some(3));
        assert_eq!(events[1].team_id, Some(200));
        // Id 0 is "no player".
        assert_eq!(events[2].provider_player_id, None);
        // Unknown id keeps the provider id but maps to nothing.
        assert_eq!(events[3].provider_player_id.as_deref(), Some("4242"));
        assert_eq!(events[3].player_id, None);
    }

    #[test]
    fn test_kinds_and_flags() {
        let events = standardized();
        assert_eq!(events[0].kind, EventKind::Pass);
        assert_eq!(events[1].kind, EventKind::Pass);
        assert!(events[1].is_head);
        assert_eq!(events[1].refine_radius, Some(REFINE_RADIUS));
        assert!(!events[2].matchable);
        assert!(!events[2].to_refine);
        assert_eq!(events[3].kind, EventKind::Shot);
    }

    #[test]
    fn test_location_projection() {
        let events = standardized();
        assert_eq!(events[0].location, Some(PitchPoint::new(0.0, 0.0)));
        let loc = events[1].location.unwrap();
        assert!((loc.x - 26.25).abs() < 1e-9);
        assert!((loc.y - 17.0).abs() < 1e-9);
        assert_eq!(events[2].location, None);
    }
}
