//! # Reporting
//!
//! Report generation over finished synchronization results.
//!
//! Responsibilities:
//! - `report_by_event`: one row per event, event metadata plus sync flags
//! - `report_by_event_type`: per-type match statistics
//! - Freeze frames: tracking snapshot at the assigned frame merged with the event
//!
//! Aggregation only; every decision was taken by the engine.
//!
//! ## Usage Example
//!
//! ```ignore
//! use reporting::ReportGenerator;
//!
//! let artifacts = ReportGenerator::new(Provider::Opta, &context)
//!     .generate(&events, &outcome, &index);
//! println!("{} freeze frames", artifacts.freeze_frames.len());
//! ```

mod by_event;
mod by_type;
mod freeze_frame;

pub use by_event::event_row;
pub use by_type::{by_event_type, match_rate_pct};
pub use freeze_frame::freeze_frame;

use contracts::{
    Event, FrameSnapshotSource, MatchContext, Provider, SyncArtifacts, SyncOutcome, TeamId,
};
use tracing::{debug, instrument};

/// Builds the three artifacts of one match
#[derive(Debug, Clone, Copy)]
pub struct ReportGenerator<'a> {
    provider: Provider,
    context: &'a MatchContext,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(provider: Provider, context: &'a MatchContext) -> Self {
        Self { provider, context }
    }

    /// Events and results are paired by position.
    #[instrument(
        name = "report_generate",
        skip_all,
        fields(provider = %self.provider, events = events.len())
    )]
    pub fn generate<S>(&self, events: &[Event], outcome: &SyncOutcome, snapshots: &S) -> SyncArtifacts
    where
        S: FrameSnapshotSource + ?Sized,
    {
        let pairs = || events.iter().zip(&outcome.results);

        let by_event: Vec<_> = pairs()
            .map(|(event, result)| event_row(self.context, event, result))
            .collect();
        let by_event_type = by_event_type(&by_event);
        let freeze_frames: Vec<_> = pairs()
            .filter_map(|(event, result)| {
                freeze_frame(self.provider, self.context, event, result, snapshots)
            })
            .collect();

        debug!(
            rows = by_event.len(),
            types = by_event_type.len(),
            freeze_frames = freeze_frames.len(),
            "reports built"
        );
        SyncArtifacts {
            provider: self.provider,
            by_event,
            by_event_type,
            freeze_frames,
        }
    }
}

/// Team of the event, else the roster team of its player.
pub(crate) fn event_team(context: &MatchContext, event: &Event) -> Option<TeamId> {
    event
        .team_id
        .or_else(|| event.player_id.and_then(|p| context.team_of(p)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use contracts::{
        MatchContext, PlayerSample, RosterEntry, SyncResult, TeamInfo, TrackingFrame,
    };

    pub fn context() -> MatchContext {
        let team = |id, name: &str| TeamInfo {
            id,
            name: name.to_string(),
            short_name: None,
        };
        let player = |id, team_id, start: Option<&str>| RosterEntry {
            id,
            team_id,
            number: Some(id as u32),
            short_name: Some(format!("P. {id}")),
            role: Some("CM".to_string()),
            start_time: start.map(str::to_string),
        };
        MatchContext {
            match_id: Some(1),
            home_team: team(10, "Home FC"),
            away_team: team(20, "Away FC"),
            roster: vec![
                player(7, 10, Some("00:00:00")),
                player(8, 20, Some("00:61:12")),
            ],
            pitch_length: 105.0,
            pitch_width: 68.0,
            home_team_side: Vec::new(),
            frame_rate: 10.0,
        }
    }

    pub fn matched(frame: u32) -> SyncResult {
        SyncResult {
            frame: Some(frame),
            implied_frame: Some(frame),
            is_matched: true,
            is_player_detected: true,
            has_player_id_attached: true,
            frame_tracking_data_available: true,
            is_matched_applicable: true,
            ..Default::default()
        }
    }

    pub fn tracking_frame(frame: u32) -> TrackingFrame {
        let mut record = TrackingFrame::new(frame, Some(1));
        record.player_data.push(PlayerSample {
            player_id: 7,
            x: Some(1.0),
            y: Some(2.0),
            is_detected: Some(true),
        });
        record
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use contracts::{FrameSnapshot, SyncResult};

    struct Frames(Vec<u32>);

    impl FrameSnapshotSource for Frames {
        fn snapshot(&self, frame: u32) -> Option<FrameSnapshot> {
            self.0.contains(&frame).then(|| FrameSnapshot {
                frame: tracking_frame(frame),
                kinematics: Vec::new(),
            })
        }
    }

    #[test]
    fn test_generate_keeps_every_event() {
        let context = context();
        let mut pass = Event::new("e1", "pass", 1, 3.0);
        pass.player_id = Some(7);
        let mut card = Event::new("e2", "card", 1, 9.0);
        card.player_id = Some(8);
        let outcome = SyncOutcome {
            periods: Vec::new(),
            results: vec![
                matched(130),
                SyncResult {
                    frame: Some(999),
                    ..Default::default()
                },
            ],
        };

        let artifacts = ReportGenerator::new(Provider::Wyscout, &context).generate(
            &[pass, card],
            &outcome,
            &Frames(vec![130]),
        );

        assert_eq!(artifacts.provider, Provider::Wyscout);
        assert_eq!(artifacts.by_event.len(), 2);
        assert_eq!(artifacts.by_event_type.len(), 2);
        assert_eq!(artifacts.by_event_type[0].event_type, "card");
        assert_eq!(artifacts.freeze_frames.len(), 1);
        assert_eq!(artifacts.freeze_frames[0].event_id, "e1");
    }

    #[test]
    fn test_event_team_falls_back_to_roster() {
        let context = context();
        let mut event = Event::new("e1", "pass", 1, 3.0);
        event.player_id = Some(8);
        assert_eq!(event_team(&context, &event), Some(20));
        event.team_id = Some(10);
        assert_eq!(event_team(&context, &event), Some(10));
    }
}
