//! Frame refinement
//!
//! Looks for the kick of a pass or shot near the offset-implied frame: the
//! last frames of the longest stretch where the player stays close to the
//! ball, and within those the sharpest change of ball speed.

use contracts::{Event, PeriodBounds, PlayerId, RefineConfig};
use tracing::trace;

use crate::index::TrackingIndex;

/// Outcome of a kick search over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KickSearch {
    /// Longest contact run, inclusive
    pub run: Option<(i64, i64)>,
    /// Kick frame, set only when the ball signal is reliable
    pub kick: Option<i64>,
}

impl KickSearch {
    /// Kick frame, else the last contact frame.
    pub fn anchor(&self) -> Option<i64> {
        self.kick.or(self.run.map(|(_, end)| end))
    }
}

/// Search `[start, end]` for the frame where `player` releases the ball.
pub fn find_kick(
    index: &TrackingIndex,
    player: PlayerId,
    start: i64,
    end: i64,
    config: &RefineConfig,
) -> KickSearch {
    if end < start {
        return KickSearch::default();
    }
    let span = (end - start + 1) as f64;

    let detected = (start..=end)
        .filter(|&f| index.player_detected(player, f))
        .count();
    if (detected as f64) / span < config.min_player_detected_ratio {
        return KickSearch::default();
    }

    let Some(run) = longest_contact_run(index, player, start, end, config.proximity_m) else {
        return KickSearch::default();
    };

    KickSearch {
        run: Some(run),
        kick: reliable_kick(index, run, config),
    }
}

/// Longest run of frames below the proximity threshold; the latest wins ties.
fn longest_contact_run(
    index: &TrackingIndex,
    player: PlayerId,
    start: i64,
    end: i64,
    proximity_m: f64,
) -> Option<(i64, i64)> {
    let mut best: Option<(i64, i64)> = None;
    let mut current: Option<i64> = None;

    for frame in start..=end + 1 {
        let close = frame <= end
            && index
                .distance(player, frame)
                .is_some_and(|d| d < proximity_m);
        match (close, current) {
            (true, None) => current = Some(frame),
            (false, Some(run_start)) => {
                let run = (run_start, frame - 1);
                if best.map_or(true, |(s, e)| run.1 - run.0 >= e - s) {
                    best = Some(run);
                }
                current = None;
            }
            _ => {}
        }
    }
    best
}

fn reliable_kick(index: &TrackingIndex, run: (i64, i64), config: &RefineConfig) -> Option<i64> {
    let (run_start, run_end) = run;
    let len = (run_end - run_start + 1) as f64;
    let ball_detected = (run_start..=run_end)
        .filter(|&f| index.ball_detected(f))
        .count();
    if (ball_detected as f64) / len < config.min_ball_detected_ratio {
        return None;
    }

    let tail_start = run_start.max(run_end - i64::from(config.last_touch_frames));
    let (frame, peak) = (tail_start..=run_end)
        .filter_map(|f| index.ball_refine_acc(f).map(|a| (f, a)))
        .fold(None, |best: Option<(i64, f64)>, (f, a)| match best {
            Some((_, b)) if b >= a => best,
            _ => Some((f, a)),
        })?;

    (peak >= config.min_ball_acc).then_some(frame)
}

/// Per-event refiner over a shared index
#[derive(Debug, Clone, Copy)]
pub struct FrameRefiner<'a> {
    index: &'a TrackingIndex,
    config: &'a RefineConfig,
}

impl<'a> FrameRefiner<'a> {
    pub fn new(index: &'a TrackingIndex, config: &'a RefineConfig) -> Self {
        Self { index, config }
    }

    /// Refined frame for `event`, or `implied` when nothing better is found.
    ///
    /// The search window is `implied ± radius`, narrowed to stay strictly
    /// between the neighbouring events and inside the period.
    pub fn refine(
        &self,
        event: &Event,
        player: PlayerId,
        implied: i64,
        bounds: &PeriodBounds,
        previous: Option<i64>,
        next: Option<i64>,
    ) -> i64 {
        let radius = i64::from(event.refine_radius.unwrap_or(self.config.window_radius));
        let mut start = implied - radius;
        let mut end = implied + radius;
        if let Some(prev) = previous {
            start = start.max(prev + 1);
        }
        if let Some(next) = next {
            end = end.min(next - 1);
        }
        let Some((start, end)) = bounds.clip(start, end) else {
            return implied;
        };

        let search = find_kick(self.index, player, i64::from(start), i64::from(end), self.config);
        match search.kick {
            Some(kick) => {
                trace!(event_id = %event.id, implied, kick, "event refined");
                kick
            }
            None => implied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EventKind, SyncConfig};
    use ingestion::{MockMatch, MockMatchConfig};

    fn mock_index() -> (MockMatch, TrackingIndex) {
        let mock = MockMatch::generate(&MockMatchConfig::default());
        let index =
            TrackingIndex::build(mock.frames.clone(), &SyncConfig::default()).unwrap();
        (mock, index)
    }

    fn pass_event() -> Event {
        let mut event = Event::new("e", "pass", 1, 0.0);
        event.kind = EventKind::Pass;
        event.to_refine = true;
        event
    }

    #[test]
    fn test_find_kick_on_mock_pass() {
        let (mock, index) = mock_index();
        let kick = i64::from(mock.kick_frames[0]);
        let search = find_kick(&index, 1, kick - 10, kick + 10, &RefineConfig::default());
        assert_eq!(search.kick, Some(kick));
        assert_eq!(search.run.unwrap().1, kick + 2);
    }

    #[test]
    fn test_refine_recovers_kick() {
        let (mock, index) = mock_index();
        let bounds = index.period(1).unwrap();
        let config = RefineConfig::default();
        let refiner = FrameRefiner::new(&index, &config);
        let kick = i64::from(mock.kick_frames[0]);

        for shift in [-7, -3, 0, 4, 8] {
            let refined = refiner.refine(&pass_event(), 1, kick + shift, &bounds, None, None);
            assert_eq!(refined, kick, "shift {shift}");
        }
    }

    #[test]
    fn test_refine_stays_in_window() {
        let (mock, index) = mock_index();
        let bounds = index.period(1).unwrap();
        let config = RefineConfig::default();
        let refiner = FrameRefiner::new(&index, &config);
        let kick = i64::from(mock.kick_frames[0]);

        // The kick is 15 frames away: outside a radius of 10.
        let implied = kick + 15;
        let refined = refiner.refine(&pass_event(), 1, implied, &bounds, None, None);
        assert!((refined - implied).abs() <= 10);
    }

    #[test]
    fn test_neighbour_bounds_window() {
        let (mock, index) = mock_index();
        let bounds = index.period(1).unwrap();
        let config = RefineConfig::default();
        let refiner = FrameRefiner::new(&index, &config);
        let kick = i64::from(mock.kick_frames[0]);

        // Next event sits on the kick: the kick is excluded from the window,
        // leaving the first frame of the speed ramp.
        let refined = refiner.refine(&pass_event(), 1, kick - 4, &bounds, None, Some(kick));
        assert_eq!(refined, kick - 1);
    }

    #[test]
    fn test_undetected_ball_keeps_implied() {
        let (mut mock, _) = mock_index();
        for frame in &mut mock.frames {
            frame.ball_data.is_detected = Some(false);
        }
        let index =
            TrackingIndex::build(mock.frames.clone(), &SyncConfig::default()).unwrap();
        let bounds = index.period(1).unwrap();
        let config = RefineConfig::default();
        let refiner = FrameRefiner::new(&index, &config);
        let kick = i64::from(mock.kick_frames[0]);

        assert_eq!(refiner.refine(&pass_event(), 1, kick + 3, &bounds, None, None), kick + 3);
    }

    #[test]
    fn test_far_player_has_no_run() {
        let (mock, index) = mock_index();
        let kick = i64::from(mock.kick_frames[0]);
        // Player 13 is nowhere near the first pass.
        let search = find_kick(&index, 13, kick - 10, kick + 10, &RefineConfig::default());
        assert_eq!(search, KickSearch::default());
        assert_eq!(search.anchor(), None);
    }
}
