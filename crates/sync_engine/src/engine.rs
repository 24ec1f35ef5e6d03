//! Match-level synchronization: offsets, frame assignment, refinement and
//! validation for every event.

use std::collections::{HashMap, HashSet};

use contracts::{
    Event, MatchContext, PeriodBounds, PeriodOffset, SyncConfig, SyncOutcome, SyncResult, TeamId,
    TrackingFrame,
};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::index::TrackingIndex;
use crate::matching::MatchValidator;
use crate::offset::OffsetEstimator;
use crate::refine::FrameRefiner;
use crate::side::SideMap;

/// Per-match state shared by every event
struct MatchState<'a> {
    context: &'a MatchContext,
    index: &'a TrackingIndex,
    events: &'a [Event],
    /// Offset-implied frame per event, unset when the period has no offset
    implied: Vec<Option<i64>>,
    /// Event indices sorted by period then timestamp
    chronological: Vec<usize>,
    /// Position of each event in `chronological`
    rank: Vec<usize>,
    bounds: HashMap<u8, PeriodBounds>,
    sides: SideMap,
    tracked_teams: HashSet<TeamId>,
}

/// Event to tracking synchronization engine
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Index a tracking stream with this engine's settings.
    pub fn index(&self, frames: Vec<TrackingFrame>) -> Result<TrackingIndex> {
        TrackingIndex::build(frames, &self.config)
    }

    /// Synchronize one match.
    ///
    /// Returns one `SyncResult` per event, in input order. Events need not
    /// arrive sorted; neighbours are taken in period then timestamp order.
    #[instrument(
        name = "sync_engine_run",
        skip_all,
        fields(events = events.len(), periods = index.periods().len())
    )]
    pub fn run(
        &self,
        context: &MatchContext,
        index: &TrackingIndex,
        events: &[Event],
    ) -> Result<SyncOutcome> {
        let periods = OffsetEstimator::new(index, &self.config).estimate_all(events)?;
        check_kickoff_order(&periods)?;
        let offsets: HashMap<u8, i64> = periods
            .iter()
            .filter_map(|p| p.offset.map(|o| (p.period, o)))
            .collect();

        let implied = events
            .iter()
            .map(|e| {
                offsets
                    .get(&e.period)
                    .map(|o| e.frames_since_kickoff(self.config.frame_rate) + o)
            })
            .collect();
        let tracked_teams = context
            .roster
            .iter()
            .filter(|p| index.has_player(p.id))
            .map(|p| p.team_id)
            .collect();

        let mut chronological: Vec<usize> = (0..events.len()).collect();
        chronological.sort_by(|&a, &b| {
            events[a]
                .period
                .cmp(&events[b].period)
                .then(events[a].timestamp_s.total_cmp(&events[b].timestamp_s))
        });
        let mut rank = vec![0; events.len()];
        for (position, &i) in chronological.iter().enumerate() {
            rank[i] = position;
        }

        let state = MatchState {
            context,
            index,
            events,
            implied,
            chronological,
            rank,
            bounds: periods.iter().map(|p| (p.period, p.bounds)).collect(),
            sides: SideMap::resolve(context, index),
            tracked_teams,
        };

        let results: Vec<SyncResult> = (0..events.len())
            .into_par_iter()
            .map(|i| self.sync_event(&state, i))
            .collect();

        let outcome = SyncOutcome { periods, results };
        self.record_metrics(&outcome);
        Ok(outcome)
    }

    fn sync_event(&self, state: &MatchState<'_>, i: usize) -> SyncResult {
        let event = &state.events[i];
        let team = event
            .team_id
            .or_else(|| event.player_id.and_then(|p| state.context.team_of(p)));
        let (projected_x, projected_y) = state.sides.project(event, team);
        let base = SyncResult {
            has_player_id_attached: event.has_provider_player_id(),
            projected_x,
            projected_y,
            ..Default::default()
        };

        let (Some(implied), Some(bounds)) = (state.implied[i], state.bounds.get(&event.period)) else {
            return base;
        };
        let is_matched_applicable = event.matchable
            && !self.config.is_non_matchable(&event.type_name)
            && team.map_or(true, |t| state.tracked_teams.contains(&t));
        if !bounds.contains(implied) {
            debug!(event_id = %event.id, implied, "implied frame outside tracked period");
            return SyncResult {
                is_matched_applicable,
                ..base
            };
        }

        let player = event.player_id.filter(|&p| state.index.has_player(p));
        let should_refine = (self.config.refine.enabled && event.to_refine) || event.force_refine;
        let frame = match player {
            Some(player) if should_refine => {
                let (previous, next) = neighbours(state, i);
                FrameRefiner::new(state.index, &self.config.refine)
                    .refine(event, player, implied, bounds, previous, next)
            }
            _ => implied,
        };

        let verdict = player
            .map(|p| MatchValidator::new(state.index, &self.config.validation).validate(p, frame))
            .unwrap_or_default();

        SyncResult {
            frame: u32::try_from(frame).ok(),
            implied_frame: u32::try_from(implied).ok(),
            is_matched: verdict.is_matched,
            is_player_detected: verdict.is_player_detected,
            frame_tracking_data_available: state.index.frame(frame).is_some(),
            is_matched_applicable,
            ..base
        }
    }

    fn record_metrics(&self, outcome: &SyncOutcome) {
        let mut matched = 0u64;
        let mut unmatched = 0u64;
        let mut refined = 0u64;
        for result in &outcome.results {
            match result.reported_is_matched() {
                Some(true) => matched += 1,
                Some(false) => unmatched += 1,
                None => {}
            }
            if result.was_refined() {
                refined += 1;
            }
        }
        let not_applicable = outcome.results.len() as u64 - matched - unmatched;

        metrics::counter!("event_sync_events_total", "status" => "matched").increment(matched);
        metrics::counter!("event_sync_events_total", "status" => "unmatched").increment(unmatched);
        metrics::counter!("event_sync_events_total", "status" => "not_applicable")
            .increment(not_applicable);
        metrics::counter!("event_sync_refined_total").increment(refined);

        let applicable = matched + unmatched;
        if applicable > 0 {
            let rate = matched as f64 / applicable as f64 * 100.0;
            metrics::gauge!("event_sync_match_rate_pct").set(rate);
            info!(matched, applicable, refined, match_rate_pct = rate, "events synchronized");
        } else {
            info!(refined, "events synchronized, none applicable");
        }
    }
}

/// Implied frames of the chronologically adjacent events of the same
/// period, kept only when they lie on the expected side of the event.
fn neighbours(state: &MatchState<'_>, i: usize) -> (Option<i64>, Option<i64>) {
    let event = &state.events[i];
    let implied = state.implied[i];
    let at = |position: usize| {
        let j = *state.chronological.get(position)?;
        if state.events[j].period != event.period {
            return None;
        }
        state.implied[j]
    };
    let position = state.rank[i];
    let previous = position
        .checked_sub(1)
        .and_then(at)
        .filter(|&p| implied.is_some_and(|f| p < f));
    let next = at(position + 1).filter(|&n| implied.is_some_and(|f| n > f));
    (previous, next)
}

/// Event kick-offs must land in the tracking stream in period order.
fn check_kickoff_order(periods: &[PeriodOffset]) -> Result<()> {
    let kickoffs: Vec<(u8, i64)> = periods
        .iter()
        .filter_map(|p| p.offset.map(|o| (p.period, o)))
        .collect();
    for pair in kickoffs.windows(2) {
        let ((earlier, earlier_frame), (later, later_frame)) = (pair[0], pair[1]);
        if later_frame <= earlier_frame {
            return Err(SyncError::period_order(format!(
                "period {later} kicks off at frame {later_frame}, \
                 not after period {earlier} at frame {earlier_frame}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EventKind, OffsetSource, PitchPoint, Projected};
    use ingestion::{MockMatch, MockMatchConfig};

    fn setup(config: &SyncConfig) -> (MockMatch, MatchContext, TrackingIndex) {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let context = mock.match_data.to_context(config.frame_rate);
        let index = SyncEngine::new(config.clone())
            .index(mock.frames.clone())
            .unwrap();
        (mock, context, index)
    }

    fn passes<'a>(
        mock: &'a MockMatch,
        outcome: &'a SyncOutcome,
    ) -> impl Iterator<Item = (&'a Event, &'a SyncResult)> {
        mock.events
            .iter()
            .zip(&outcome.results)
            .filter(|(e, _)| e.kind == EventKind::Pass)
    }

    #[test]
    fn test_full_match_synchronizes() {
        let config = SyncConfig::default();
        let (mock, context, index) = setup(&config);
        let outcome = SyncEngine::new(config).run(&context, &index, &mock.events).unwrap();

        assert_eq!(outcome.results.len(), mock.events.len());
        assert_eq!(outcome.period(1).and_then(|p| p.drift()), Some(12));
        assert_eq!(outcome.period(2).and_then(|p| p.drift()), Some(-8));

        for ((_, result), kick) in passes(&mock, &outcome).zip(&mock.kick_frames) {
            assert_eq!(result.frame, Some(*kick));
            assert_eq!(result.reported_is_matched(), Some(true));
            assert!(result.is_player_detected);
            assert!(result.has_player_id_attached);
            assert!(result.frame_tracking_data_available);
        }
        assert_eq!(outcome.applicable_count(), mock.kick_frames.len());
        assert_eq!(outcome.matched_count(), mock.kick_frames.len());
    }

    #[test]
    fn test_non_matchable_event_keeps_frame() {
        let config = SyncConfig::default();
        let (mock, context, index) = setup(&config);
        let outcome = SyncEngine::new(config).run(&context, &index, &mock.events).unwrap();

        let (_, stoppage) = mock
            .events
            .iter()
            .zip(&outcome.results)
            .find(|(e, _)| e.type_name == "game_interruption")
            .unwrap();
        assert!(stoppage.frame.is_some());
        assert!(!stoppage.is_matched_applicable);
        assert_eq!(stoppage.reported_is_matched(), None);
    }

    #[test]
    fn test_configured_non_matchable_type() {
        let config = SyncConfig {
            non_matchable_types: vec!["pass".to_string()],
            ..Default::default()
        };
        let (mock, context, index) = setup(&config);
        let outcome = SyncEngine::new(config).run(&context, &index, &mock.events).unwrap();

        assert_eq!(outcome.applicable_count(), 0);
        assert!(passes(&mock, &outcome).all(|(_, r)| r.frame.is_some()));
    }

    #[test]
    fn test_undetected_ball_leaves_nothing_to_align() {
        let config = SyncConfig::default();
        let (mut mock, context, _) = setup(&config);
        for frame in &mut mock.frames {
            frame.ball_data.is_detected = Some(false);
        }
        let engine = SyncEngine::new(config);
        let index = engine.index(mock.frames.clone()).unwrap();
        let err = engine.run(&context, &index, &mock.events).unwrap_err();
        assert!(matches!(err, SyncError::NoEstimablePeriod { .. }));
    }

    #[test]
    fn test_ball_lost_around_one_kick() {
        let config = SyncConfig::default();
        let (mut mock, context, _) = setup(&config);
        let kick = mock.kick_frames[0];
        for frame in &mut mock.frames {
            if frame.frame.abs_diff(kick) <= 20 {
                frame.ball_data.is_detected = Some(false);
            }
        }
        let engine = SyncEngine::new(config);
        let index = engine.index(mock.frames.clone()).unwrap();
        let outcome = engine.run(&context, &index, &mock.events).unwrap();

        let (_, first) = passes(&mock, &outcome).next().unwrap();
        assert_eq!(first.frame, Some(kick));
        assert!(first.is_matched_applicable);
        assert_eq!(first.reported_is_matched(), Some(false));
        assert!(first.frame_tracking_data_available);

        let matched_elsewhere = passes(&mock, &outcome)
            .skip(1)
            .all(|(_, r)| r.reported_is_matched() == Some(true));
        assert!(matched_elsewhere);
    }

    #[test]
    fn test_tighter_threshold_never_adds_matches() {
        let loose = SyncConfig::default();
        let (mock, context, index) = setup(&loose);
        let mut tight = loose.clone();
        tight.validation.proximity_m = 0.4;

        let loose_outcome = SyncEngine::new(loose).run(&context, &index, &mock.events).unwrap();
        let tight_outcome = SyncEngine::new(tight).run(&context, &index, &mock.events).unwrap();
        assert!(tight_outcome.matched_count() <= loose_outcome.matched_count());
        assert_eq!(tight_outcome.matched_count(), 0);
    }

    #[test]
    fn test_rerun_is_identical() {
        let config = SyncConfig::default();
        let (mock, context, index) = setup(&config);
        let engine = SyncEngine::new(config);
        let first = engine.run(&context, &index, &mock.events).unwrap();
        let second = engine.run(&context, &index, &mock.events).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_late_recorded_event_is_synchronized() {
        let config = SyncConfig::default();
        let (mut mock, context, index) = setup(&config);
        let engine = SyncEngine::new(config);
        let sorted = engine.run(&context, &index, &mock.events).unwrap();

        let moved = mock
            .events
            .iter()
            .position(|e| e.period == 1 && e.kind != EventKind::Pass)
            .unwrap();
        let event = mock.events.remove(moved);
        mock.events.push(event);

        let shuffled = engine.run(&context, &index, &mock.events).unwrap();
        assert_eq!(shuffled.periods, sorted.periods);
        let last = shuffled.results.len() - 1;
        assert_eq!(shuffled.results[last], sorted.results[moved]);
        for ((_, result), kick) in passes(&mock, &shuffled).zip(&mock.kick_frames) {
            assert_eq!(result.frame, Some(*kick));
        }
    }

    #[test]
    fn test_kickoffs_out_of_tracking_order() {
        let period = |period: u8, first_frame: u32, offset: Option<i64>| PeriodOffset {
            period,
            bounds: PeriodBounds {
                period,
                first_frame,
                last_frame: first_frame + 500,
            },
            offset,
            source: OffsetSource::Estimated {
                score_m: 0.5,
                sample_size: 10,
            },
        };

        let ordered = [period(1, 100, Some(110)), period(2, 1000, Some(990))];
        assert!(check_kickoff_order(&ordered).is_ok());

        let unset = [period(1, 100, None), period(2, 1000, Some(990))];
        assert!(check_kickoff_order(&unset).is_ok());

        let crossed = [period(1, 100, Some(1200)), period(2, 1000, Some(990))];
        let err = check_kickoff_order(&crossed).unwrap_err();
        assert!(matches!(err, SyncError::PeriodOrder { .. }), "{err}");
    }

    #[test]
    fn test_untracked_period_and_out_of_range_frame() {
        let config = SyncConfig::default();
        let (mut mock, context, index) = setup(&config);

        let mut late = Event::new("late", "shot", 2, 10_000.0);
        late.player_id = Some(1);
        let mut extra_time = Event::new("et", "shot", 3, 5.0);
        extra_time.player_id = Some(1);
        mock.events.push(late);
        mock.events.push(extra_time);

        let outcome = SyncEngine::new(config).run(&context, &index, &mock.events).unwrap();
        let n = outcome.results.len();

        let late = &outcome.results[n - 2];
        assert_eq!(late.frame, None);
        assert!(late.is_matched_applicable);
        assert_eq!(late.reported_is_matched(), Some(false));
        assert!(!late.frame_tracking_data_available);

        let extra_time = &outcome.results[n - 1];
        assert_eq!(extra_time.frame, None);
        assert!(!extra_time.is_matched_applicable);
    }

    #[test]
    fn test_projection_follows_attacking_side() {
        let config = SyncConfig::default();
        let (mut mock, context, index) = setup(&config);
        let first = mock
            .events
            .iter_mut()
            .find(|e| e.period == 2 && e.kind == EventKind::Pass)
            .unwrap();
        first.location = Some(PitchPoint::new(12.346, 6.0));
        let team = first.team_id;

        let outcome = SyncEngine::new(config).run(&context, &index, &mock.events).unwrap();
        let (_, result) = mock
            .events
            .iter()
            .zip(&outcome.results)
            .find(|(e, _)| e.period == 2 && e.kind == EventKind::Pass)
            .unwrap();

        // Home attacks right to left in the second period.
        let expected = if team == Some(ingestion::MOCK_HOME_TEAM) { -1.0 } else { 1.0 };
        assert_eq!(result.projected_x, Projected::Value(expected * 12.35));
        assert_eq!(result.projected_y, Projected::Value(expected * 6.0));
    }
}
