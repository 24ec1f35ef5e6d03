//! Dense tracking index
//!
//! Frames are stored on a dense axis starting at the first frame number of
//! the stream; gaps become empty slots. Ball and player positions are kept
//! as columns so windowed scans are plain slice walks.

use std::collections::{BTreeMap, HashMap};

use contracts::{
    FrameSnapshot, FrameSnapshotSource, PeriodBounds, PlayerId, PlayerKinematics, SyncConfig,
    TrackingFrame,
};
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::kinematics::{ball_refine_acc, player_kinematics, Position};

/// Per-player columns
#[derive(Debug, Clone)]
struct PlayerTrack {
    position: Vec<Option<Position>>,
    detected: Vec<bool>,
    kinematics: Vec<PlayerKinematics>,
}

/// Random-access view over an immutable tracking stream
#[derive(Debug, Clone)]
pub struct TrackingIndex {
    base: u32,
    frames: Vec<Option<TrackingFrame>>,
    periods: Vec<PeriodBounds>,
    ball: Vec<Option<Position>>,
    ball_detected: Vec<bool>,
    ball_refine_acc: Vec<Option<f64>>,
    players: HashMap<PlayerId, PlayerTrack>,
    frame_rate: f64,
}

impl TrackingIndex {
    /// Index a tracking stream.
    ///
    /// Fails on an empty stream, on a frame range longer than
    /// `max_tracking_span_s`, and on overlapping or out-of-order periods.
    pub fn build(frames: Vec<TrackingFrame>, config: &SyncConfig) -> Result<Self> {
        let (kinematics, frame_rate) = (&config.kinematics, config.frame_rate);
        let (Some(min), Some(max)) = (
            frames.iter().map(|f| f.frame).min(),
            frames.iter().map(|f| f.frame).max(),
        ) else {
            return Err(SyncError::EmptyTracking);
        };

        let len = u64::from(max - min) + 1;
        let max_frames = (config.max_tracking_span_s * frame_rate).ceil() as u64;
        if len > max_frames {
            return Err(SyncError::TrackingSpan {
                first: min,
                last: max,
                max_frames,
            });
        }
        let len = len as usize;
        let mut slots: Vec<Option<TrackingFrame>> = vec![None; len];
        let mut duplicates = 0usize;
        for frame in frames {
            let slot = &mut slots[(frame.frame - min) as usize];
            if slot.is_some() {
                duplicates += 1;
                continue;
            }
            *slot = Some(frame);
        }
        if duplicates > 0 {
            warn!(duplicates, "duplicate tracking frames ignored");
        }

        let periods = period_bounds(&slots)?;

        let mut ball = vec![None; len];
        let mut ball_detected = vec![false; len];
        let mut players: HashMap<PlayerId, PlayerTrack> = HashMap::new();
        for (idx, frame) in slots.iter().enumerate() {
            let Some(frame) = frame else { continue };
            ball[idx] = frame.ball_data.position().map(|(x, y)| Position::new(x, y));
            ball_detected[idx] = frame.ball_data.detected_position().is_some();
            for sample in &frame.player_data {
                let track = players.entry(sample.player_id).or_insert_with(|| PlayerTrack {
                    position: vec![None; len],
                    detected: vec![false; len],
                    kinematics: Vec::new(),
                });
                track.position[idx] = sample.position().map(|(x, y)| Position::new(x, y));
                track.detected[idx] = sample.detected();
            }
        }

        for track in players.values_mut() {
            track.kinematics = player_kinematics(&track.position, kinematics, frame_rate);
        }
        let ball_refine_acc = ball_refine_acc(&ball, kinematics, frame_rate);

        debug!(
            frames = len,
            periods = periods.len(),
            players = players.len(),
            "tracking indexed"
        );

        Ok(Self {
            base: min,
            frames: slots,
            periods,
            ball,
            ball_detected,
            ball_refine_acc,
            players,
            frame_rate,
        })
    }

    fn slot(&self, frame: i64) -> Option<usize> {
        let idx = frame.checked_sub(i64::from(self.base))?;
        usize::try_from(idx).ok().filter(|&i| i < self.frames.len())
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn periods(&self) -> &[PeriodBounds] {
        &self.periods
    }

    pub fn period(&self, period: u8) -> Option<PeriodBounds> {
        self.periods.iter().find(|p| p.period == period).copied()
    }

    /// Tracking record at a frame, when one exists.
    pub fn frame(&self, frame: i64) -> Option<&TrackingFrame> {
        self.frames[self.slot(frame)?].as_ref()
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    pub fn ball_position(&self, frame: i64) -> Option<Position> {
        self.ball[self.slot(frame)?]
    }

    pub fn ball_detected(&self, frame: i64) -> bool {
        self.slot(frame).is_some_and(|i| self.ball_detected[i])
    }

    pub fn ball_refine_acc(&self, frame: i64) -> Option<f64> {
        self.ball_refine_acc[self.slot(frame)?].filter(|a| a.is_finite())
    }

    pub fn player_position(&self, player_id: PlayerId, frame: i64) -> Option<Position> {
        self.players.get(&player_id)?.position[self.slot(frame)?]
    }

    pub fn player_detected(&self, player_id: PlayerId, frame: i64) -> bool {
        match (self.players.get(&player_id), self.slot(frame)) {
            (Some(track), Some(i)) => track.detected[i],
            _ => false,
        }
    }

    /// Player-ball distance, whatever the ball detection state.
    pub fn distance(&self, player_id: PlayerId, frame: i64) -> Option<f64> {
        let player = self.player_position(player_id, frame)?;
        let ball = self.ball_position(frame)?;
        Some((player - ball).norm())
    }

    /// Player-ball distance at a frame where the ball is detected.
    pub fn detected_distance(&self, player_id: PlayerId, frame: i64) -> Option<f64> {
        if !self.ball_detected(frame) {
            return None;
        }
        self.distance(player_id, frame)
    }

    /// Mean x of the given players over a period.
    pub fn mean_x(&self, players: &[PlayerId], bounds: &PeriodBounds) -> Option<f64> {
        let (mut sum, mut count) = (0.0, 0usize);
        for player in players {
            let Some(track) = self.players.get(player) else {
                continue;
            };
            for frame in bounds.first_frame..=bounds.last_frame {
                if let Some(p) = self.slot(i64::from(frame)).and_then(|i| track.position[i]) {
                    sum += p.x;
                    count += 1;
                }
            }
        }
        (count > 0).then(|| sum / count as f64)
    }
}

impl FrameSnapshotSource for TrackingIndex {
    fn snapshot(&self, frame: u32) -> Option<FrameSnapshot> {
        let idx = self.slot(i64::from(frame))?;
        let record = self.frames[idx].clone()?;
        let kinematics = record
            .player_data
            .iter()
            .map(|p| {
                self.players
                    .get(&p.player_id)
                    .map(|t| t.kinematics[idx])
                    .unwrap_or_default()
            })
            .collect();
        Some(FrameSnapshot {
            frame: record,
            kinematics,
        })
    }
}

/// Derive inclusive period ranges and check they are strictly ordered.
fn period_bounds(slots: &[Option<TrackingFrame>]) -> Result<Vec<PeriodBounds>> {
    let mut ranges: BTreeMap<u8, (u32, u32)> = BTreeMap::new();
    for frame in slots.iter().flatten() {
        let Some(period) = frame.period else { continue };
        ranges
            .entry(period)
            .and_modify(|(first, last)| {
                *first = (*first).min(frame.frame);
                *last = (*last).max(frame.frame);
            })
            .or_insert((frame.frame, frame.frame));
    }

    let bounds: Vec<PeriodBounds> = ranges
        .into_iter()
        .map(|(period, (first_frame, last_frame))| PeriodBounds {
            period,
            first_frame,
            last_frame,
        })
        .collect();

    for pair in bounds.windows(2) {
        if pair[0].last_frame >= pair[1].first_frame {
            return Err(SyncError::period_order(format!(
                "tracking period {} (frames {}..={}) overlaps period {} (frames {}..={})",
                pair[0].period,
                pair[0].first_frame,
                pair[0].last_frame,
                pair[1].period,
                pair[1].first_frame,
                pair[1].last_frame
            )));
        }
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BallSample, PlayerSample};

    fn frame(n: u32, period: Option<u8>, ball: Option<(f64, f64)>, player: Option<(f64, f64)>) -> TrackingFrame {
        let mut f = TrackingFrame::new(n, period);
        if let Some((x, y)) = ball {
            f.ball_data = BallSample {
                x: Some(x),
                y: Some(y),
                z: Some(0.0),
                is_detected: Some(true),
            };
        }
        if let Some((x, y)) = player {
            f.player_data.push(PlayerSample {
                player_id: 7,
                x: Some(x),
                y: Some(y),
                is_detected: Some(true),
            });
        }
        f
    }

    fn build(frames: Vec<TrackingFrame>) -> Result<TrackingIndex> {
        TrackingIndex::build(frames, &SyncConfig::default())
    }

    #[test]
    fn test_empty_stream_rejected() {
        assert!(matches!(build(vec![]), Err(SyncError::EmptyTracking)));
    }

    #[test]
    fn test_stray_frame_number_rejected() {
        let result = build(vec![
            frame(10, Some(1), Some((0.0, 0.0)), Some((1.0, 1.0))),
            frame(4_000_000_000, Some(2), Some((0.0, 0.0)), Some((1.0, 1.0))),
        ]);
        assert!(matches!(
            result,
            Err(SyncError::TrackingSpan { first: 10, last: 4_000_000_000, max_frames: 144_000 })
        ));
    }

    #[test]
    fn test_span_limit_follows_config() {
        let frames = vec![
            frame(0, Some(1), Some((0.0, 0.0)), None),
            frame(600, Some(1), Some((0.0, 0.0)), None),
        ];
        let tight = SyncConfig {
            max_tracking_span_s: 60.0,
            ..SyncConfig::default()
        };
        assert!(matches!(
            TrackingIndex::build(frames.clone(), &tight),
            Err(SyncError::TrackingSpan { max_frames: 600, .. })
        ));
        assert!(build(frames).is_ok());
    }

    #[test]
    fn test_gaps_and_bounds() {
        let index = build(vec![
            frame(10, Some(1), Some((0.0, 0.0)), Some((1.0, 1.0))),
            frame(11, Some(1), None, None),
            frame(15, Some(2), Some((3.0, 4.0)), Some((0.0, 0.0))),
        ])
        .unwrap();

        assert_eq!(index.periods().len(), 2);
        assert_eq!(index.period(1).unwrap().last_frame, 11);
        assert!(index.frame(12).is_none());
        assert!(index.frame(9).is_none());
        assert!(index.frame(11).is_some());
        assert!((index.distance(7, 10).unwrap() - 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(index.distance(7, 15), Some(5.0));
        assert_eq!(index.distance(7, 11), None);
        assert!(!index.player_detected(7, 11));
    }

    #[test]
    fn test_overlapping_periods_rejected() {
        let result = build(vec![
            frame(1, Some(1), None, None),
            frame(2, Some(2), None, None),
            frame(3, Some(1), None, None),
        ]);
        assert!(matches!(result, Err(SyncError::PeriodOrder { .. })));
    }

    #[test]
    fn test_undetected_ball() {
        let mut f = frame(1, Some(1), Some((0.0, 0.0)), Some((1.0, 0.0)));
        f.ball_data.is_detected = Some(false);
        let index = build(vec![f]).unwrap();
        assert_eq!(index.distance(7, 1), Some(1.0));
        assert_eq!(index.detected_distance(7, 1), None);
    }

    #[test]
    fn test_snapshot_aligns_kinematics() {
        let frames = (0..10)
            .map(|i| frame(i, Some(1), Some((0.0, 0.0)), Some((i as f64 * 0.5, 0.0))))
            .collect();
        let index = build(frames).unwrap();
        let snapshot = index.snapshot(5).unwrap();
        assert_eq!(snapshot.kinematics.len(), 1);
        assert_eq!(snapshot.kinematics[0].speed_norm, Some(5.0));
        assert!(index.snapshot(42).is_none());
    }
}
