//! Tracking stream model
//!
//! One `TrackingFrame` per line of the tracking JSONL. Fields the synchronizer
//! does not interpret are carried in `extra` so freeze frames can echo the
//! source record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::PlayerId;

/// Ball sample of a single frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BallSample {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub is_detected: Option<bool>,
}

impl BallSample {
    /// Planar ball position when known.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    /// Ball position backed by an actual detection.
    ///
    /// A missing flag counts as detected whenever a position is present;
    /// an explicit `false` marks an extrapolated position.
    pub fn detected_position(&self) -> Option<(f64, f64)> {
        if self.is_detected == Some(false) {
            return None;
        }
        self.position()
    }
}

/// Player sample of a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSample {
    pub player_id: PlayerId,
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(default)]
    pub is_detected: Option<bool>,
}

impl PlayerSample {
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    pub fn detected(&self) -> bool {
        self.is_detected.unwrap_or(true) && self.position().is_some()
    }
}

/// One record of the tracking stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    pub frame: u32,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub period: Option<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ball_data: BallSample,
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_data: Vec<PlayerSample>,
    /// Remaining source fields, echoed untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackingFrame {
    pub fn new(frame: u32, period: Option<u8>) -> Self {
        Self {
            frame,
            timestamp: None,
            period,
            ball_data: BallSample::default(),
            player_data: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerSample> {
        self.player_data.iter().find(|p| p.player_id == player_id)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Frame range covered by one period in the tracking stream (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBounds {
    pub period: u8,
    pub first_frame: u32,
    pub last_frame: u32,
}

impl PeriodBounds {
    pub fn contains(&self, frame: i64) -> bool {
        frame >= i64::from(self.first_frame) && frame <= i64::from(self.last_frame)
    }

    pub fn frame_count(&self) -> u32 {
        self.last_frame - self.first_frame + 1
    }

    /// Clamp an inclusive window to the period.
    pub fn clip(&self, start: i64, end: i64) -> Option<(u32, u32)> {
        let start = start.max(i64::from(self.first_frame));
        let end = end.min(i64::from(self.last_frame));
        (start <= end).then(|| (start as u32, end as u32))
    }
}

/// Derived kinematics of one player at one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerKinematics {
    pub speed_norm: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub acc_norm: Option<f64>,
}

/// Tracking record at a frame together with player kinematics.
///
/// `kinematics` is aligned index-for-index with `frame.player_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub frame: TrackingFrame,
    pub kinematics: Vec<PlayerKinematics>,
}

/// Random access to tracking snapshots by frame number
pub trait FrameSnapshotSource {
    fn snapshot(&self, frame: u32) -> Option<FrameSnapshot>;
}
