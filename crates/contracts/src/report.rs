//! Output artifact contracts
//!
//! Row types for the two CSV reports and the freeze-frame record, plus the
//! `SyncArtifacts` bundle handed to sinks. Cell rendering lives here so every
//! sink renders identically.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::{FrameSnapshot, PlayerId, Projected, Provider, ProviderId, TeamId, TeamType};

/// Render a boolean the way downstream consumers expect.
pub fn bool_cell(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn opt_cell<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// One row of `report_by_event.csv`
#[derive(Debug, Clone, PartialEq)]
pub struct EventReportRow {
    pub event_id: ProviderId,
    pub event_type: String,
    pub period: u8,
    pub frame: Option<u32>,
    pub player_id: Option<PlayerId>,
    pub provider_player_id: Option<ProviderId>,
    pub player_name: Option<String>,
    pub player_role: Option<String>,
    pub player_number: Option<u32>,
    pub starting: bool,
    pub team_id: Option<TeamId>,
    pub provider_team_id: Option<ProviderId>,
    pub team_type: Option<TeamType>,
    pub team_name: Option<String>,
    /// `None` when matching is not applicable
    pub is_matched: Option<bool>,
    pub is_player_detected: bool,
    pub has_provider_player_id_attached: bool,
    pub frame_tracking_data_available: bool,
    pub is_matched_applicable: bool,
}

impl EventReportRow {
    pub fn headers(provider: Provider) -> Vec<String> {
        let p = provider.prefix();
        vec![
            format!("{p}_event_id"),
            format!("{p}_event_type"),
            "period".into(),
            "frame".into(),
            "player_id".into(),
            format!("{p}_player_id"),
            "player_name".into(),
            "player_role".into(),
            "player_number".into(),
            "starting".into(),
            "team_id".into(),
            format!("{p}_team_id"),
            "team_type".into(),
            "team_name".into(),
            "is_matched".into(),
            "is_player_detected".into(),
            format!("has_{p}_player_id_attached"),
            "frame_tracking_data_available".into(),
            "is_matched_applicable".into(),
        ]
    }

    pub fn record(&self) -> Vec<String> {
        vec![
            self.event_id.to_string(),
            self.event_type.clone(),
            self.period.to_string(),
            opt_cell(self.frame.as_ref()),
            opt_cell(self.player_id.as_ref()),
            opt_cell(self.provider_player_id.as_ref()),
            self.player_name.clone().unwrap_or_default(),
            self.player_role.clone().unwrap_or_default(),
            opt_cell(self.player_number.as_ref()),
            bool_cell(self.starting).into(),
            opt_cell(self.team_id.as_ref()),
            opt_cell(self.provider_team_id.as_ref()),
            self.team_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            self.team_name.clone().unwrap_or_default(),
            self.is_matched
                .map(|m| bool_cell(m).to_string())
                .unwrap_or_default(),
            bool_cell(self.is_player_detected).into(),
            bool_cell(self.has_provider_player_id_attached).into(),
            bool_cell(self.frame_tracking_data_available).into(),
            bool_cell(self.is_matched_applicable).into(),
        ]
    }
}

/// One row of `report_by_event_type.csv`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventTypeReportRow {
    pub event_type: String,
    /// Every event of the type, applicable or not
    pub nb_events: usize,
    pub is_matched: usize,
    /// `is_matched / (is_matched + is_not_matched)` in percent, 1 decimal
    pub pct_is_matched: Option<f64>,
    pub is_matched_is_player_detected: usize,
    pub is_not_matched: usize,
    pub is_not_matched_is_player_detected: usize,
    pub is_not_matched_has_provider_player_id_attached: usize,
    pub is_not_matched_frame_tracking_data_available: usize,
    pub is_matched_applicable: bool,
}

impl EventTypeReportRow {
    pub fn headers(provider: Provider) -> Vec<String> {
        let p = provider.prefix();
        vec![
            format!("{p}_event_type"),
            "nb_events".into(),
            "is_matched".into(),
            "%_is_matched".into(),
            "is_matched_is_player_detected".into(),
            "is_not_matched".into(),
            "is_not_matched_is_player_detected".into(),
            format!("is_not_matched_has_{p}_player_id_attached"),
            "is_not_matched_frame_tracking_data_available".into(),
            "is_matched_applicable".into(),
        ]
    }

    pub fn record(&self) -> Vec<String> {
        vec![
            self.event_type.clone(),
            self.nb_events.to_string(),
            self.is_matched.to_string(),
            self.pct_is_matched
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default(),
            self.is_matched_is_player_detected.to_string(),
            self.is_not_matched.to_string(),
            self.is_not_matched_is_player_detected.to_string(),
            self.is_not_matched_has_provider_player_id_attached
                .to_string(),
            self.is_not_matched_frame_tracking_data_available
                .to_string(),
            bool_cell(self.is_matched_applicable).into(),
        ]
    }
}

/// Tracking snapshot merged with the event believed to happen in it
#[derive(Debug, Clone, PartialEq)]
pub struct FreezeFrameRecord {
    pub provider: Provider,
    pub snapshot: FrameSnapshot,
    pub event_id: ProviderId,
    pub event_type: String,
    pub player_id: Option<PlayerId>,
    pub provider_player_id: Option<ProviderId>,
    pub team_id: Option<TeamId>,
    pub provider_team_id: Option<ProviderId>,
    pub is_matched: Option<bool>,
    pub is_player_detected: bool,
    pub projected_x: Projected,
    pub projected_y: Projected,
}

/// Player sample enriched with kinematics, as written in freeze frames
#[derive(Serialize)]
struct EnrichedPlayer {
    x: Option<f64>,
    y: Option<f64>,
    player_id: PlayerId,
    is_detected: Option<bool>,
    speed_norm: Option<f64>,
    vx: Option<f64>,
    vy: Option<f64>,
    acc_norm: Option<f64>,
}

impl Serialize for FreezeFrameRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let p = self.provider.prefix();
        let frame = &self.snapshot.frame;
        let players: Vec<EnrichedPlayer> = frame
            .player_data
            .iter()
            .enumerate()
            .map(|(idx, sample)| {
                let kin = self
                    .snapshot
                    .kinematics
                    .get(idx)
                    .copied()
                    .unwrap_or_default();
                EnrichedPlayer {
                    x: sample.x,
                    y: sample.y,
                    player_id: sample.player_id,
                    is_detected: sample.is_detected,
                    speed_norm: kin.speed_norm,
                    vx: kin.vx,
                    vy: kin.vy,
                    acc_norm: kin.acc_norm,
                }
            })
            .collect();

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("frame", &frame.frame)?;
        map.serialize_entry("timestamp", &frame.timestamp)?;
        map.serialize_entry("period", &frame.period)?;
        map.serialize_entry("ball_data", &frame.ball_data)?;
        map.serialize_entry("player_data", &players)?;
        for (key, value) in &frame.extra {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(&format!("{p}_event_id"), &self.event_id)?;
        map.serialize_entry(&format!("{p}_event_type"), &self.event_type)?;
        map.serialize_entry("player_id", &self.player_id)?;
        map.serialize_entry(&format!("{p}_player_id"), &self.provider_player_id)?;
        map.serialize_entry("team_id", &self.team_id)?;
        map.serialize_entry(&format!("{p}_team_id"), &self.provider_team_id)?;
        map.serialize_entry("is_matched", &self.is_matched)?;
        map.serialize_entry("is_player_detected", &self.is_player_detected)?;
        map.serialize_entry(&format!("projected_{p}_event_x"), &self.projected_x)?;
        map.serialize_entry(&format!("projected_{p}_event_y"), &self.projected_y)?;
        map.end()
    }
}

/// Everything a run produces, ready for the sinks
#[derive(Debug, Clone, PartialEq)]
pub struct SyncArtifacts {
    pub provider: Provider,
    pub by_event: Vec<EventReportRow>,
    pub by_event_type: Vec<EventTypeReportRow>,
    pub freeze_frames: Vec<FreezeFrameRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BallSample, PlayerKinematics, PlayerSample, TrackingFrame};

    fn row() -> EventReportRow {
        EventReportRow {
            event_id: "ev-1".into(),
            event_type: "Pass".into(),
            period: 1,
            frame: Some(1520),
            player_id: Some(77),
            provider_player_id: Some("3021".into()),
            player_name: Some("J. Doe".into()),
            player_role: Some("CM".into()),
            player_number: Some(8),
            starting: true,
            team_id: Some(10),
            provider_team_id: Some("501".into()),
            team_type: Some(TeamType::Home),
            team_name: Some("Home FC".into()),
            is_matched: Some(true),
            is_player_detected: true,
            has_provider_player_id_attached: true,
            frame_tracking_data_available: true,
            is_matched_applicable: true,
        }
    }

    #[test]
    fn test_event_row_matches_headers() {
        let headers = EventReportRow::headers(Provider::Opta);
        let record = row().record();
        assert_eq!(headers.len(), record.len());
        assert_eq!(headers[0], "opta_event_id");
        assert_eq!(headers[16], "has_opta_player_id_attached");
        assert_eq!(record[3], "1520");
        assert_eq!(record[12], "home_team");
        assert_eq!(record[14], "True");
    }

    #[test]
    fn test_non_applicable_is_matched_renders_empty() {
        let mut row = row();
        row.is_matched = None;
        row.is_matched_applicable = false;
        row.frame = None;
        let record = row.record();
        assert_eq!(record[3], "");
        assert_eq!(record[14], "");
        assert_eq!(record[18], "False");
    }

    #[test]
    fn test_type_row_percentage_format() {
        let row = EventTypeReportRow {
            event_type: "Pass".into(),
            nb_events: 7,
            is_matched: 6,
            pct_is_matched: Some(85.7),
            is_not_matched: 1,
            is_matched_applicable: true,
            ..Default::default()
        };
        let record = row.record();
        assert_eq!(record.len(), EventTypeReportRow::headers(Provider::Wyscout).len());
        assert_eq!(record[3], "85.7");

        let full = EventTypeReportRow {
            pct_is_matched: Some(100.0),
            ..row
        };
        assert_eq!(full.record()[3], "100.0");
    }

    #[test]
    fn test_freeze_frame_serialization_keys() {
        let mut frame = TrackingFrame::new(42, Some(1));
        frame.ball_data = BallSample {
            x: Some(1.0),
            y: Some(2.0),
            z: Some(0.0),
            is_detected: Some(true),
        };
        frame.player_data.push(PlayerSample {
            player_id: 5,
            x: Some(1.5),
            y: Some(2.5),
            is_detected: Some(true),
        });
        let record = FreezeFrameRecord {
            provider: Provider::StatsBomb,
            snapshot: FrameSnapshot {
                frame,
                kinematics: vec![PlayerKinematics {
                    speed_norm: Some(3.2),
                    vx: Some(3.2),
                    vy: Some(0.0),
                    acc_norm: None,
                }],
            },
            event_id: "uuid-1".into(),
            event_type: "Pass".into(),
            player_id: Some(5),
            provider_player_id: Some("991".into()),
            team_id: Some(10),
            provider_team_id: Some("217".into()),
            is_matched: Some(true),
            is_player_detected: true,
            projected_x: Projected::Value(-10.25),
            projected_y: Projected::Unknown,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["frame"], 42);
        assert_eq!(value["statsbomb_event_id"], "uuid-1");
        assert_eq!(value["player_data"][0]["speed_norm"], 3.2);
        assert!(value["player_data"][0]["acc_norm"].is_null());
        assert_eq!(value["projected_statsbomb_event_x"], -10.25);
        assert_eq!(value["projected_statsbomb_event_y"], "unknown");
    }
}
