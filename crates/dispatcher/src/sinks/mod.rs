//! Sink implementations
//!
//! Contains CsvReportSink, FreezeFrameSink, and LogSink.

mod csv_report;
mod freeze_frame;
mod log;

pub use self::csv_report::{CsvReportSink, REPORT_BY_EVENT_FILE, REPORT_BY_EVENT_TYPE_FILE};
pub use self::freeze_frame::{FreezeFrameSink, FREEZE_FRAME_FILE};
pub use self::log::LogSink;

#[cfg(test)]
pub(crate) fn sample_artifacts() -> contracts::SyncArtifacts {
    use contracts::{
        EventReportRow, EventTypeReportRow, FrameSnapshot, FreezeFrameRecord, Projected, Provider,
        SyncArtifacts, TrackingFrame,
    };

    let row = EventReportRow {
        event_id: "1-1".into(),
        event_type: "pass".into(),
        period: 1,
        frame: Some(140),
        player_id: Some(1),
        provider_player_id: Some("p1".into()),
        player_name: Some("Player, One".into()),
        player_role: None,
        player_number: Some(1),
        starting: true,
        team_id: Some(100),
        provider_team_id: Some("t100".into()),
        team_type: None,
        team_name: None,
        is_matched: Some(true),
        is_player_detected: true,
        has_provider_player_id_attached: true,
        frame_tracking_data_available: true,
        is_matched_applicable: true,
    };
    SyncArtifacts {
        provider: Provider::Wyscout,
        by_event: vec![row],
        by_event_type: vec![EventTypeReportRow {
            event_type: "pass".into(),
            nb_events: 1,
            is_matched: 1,
            pct_is_matched: Some(100.0),
            is_matched_is_player_detected: 1,
            is_matched_applicable: true,
            ..Default::default()
        }],
        freeze_frames: vec![FreezeFrameRecord {
            provider: Provider::Wyscout,
            snapshot: FrameSnapshot {
                frame: TrackingFrame::new(140, Some(1)),
                kinematics: Vec::new(),
            },
            event_id: "1-1".into(),
            event_type: "pass".into(),
            player_id: Some(1),
            provider_player_id: Some("p1".into()),
            team_id: Some(100),
            provider_team_id: Some("t100".into()),
            is_matched: Some(true),
            is_player_detected: true,
            projected_x: Projected::Value(-29.5),
            projected_y: Projected::Unknown,
        }],
    }
}
