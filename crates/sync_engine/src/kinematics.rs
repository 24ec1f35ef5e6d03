//! Finite-difference kinematics on the dense frame axis.
//!
//! All series are indexed by frame offset; a missing sample anywhere in a
//! difference yields a missing value, never an interpolation.

use contracts::{KinematicsConfig, PlayerKinematics};
use nalgebra::Vector2;

/// Planar position in metres
pub type Position = Vector2<f64>;

/// Centred difference of a position series over `span` frames.
pub fn velocity(positions: &[Option<Position>], span: u32, frame_rate: f64) -> Vec<Option<Position>> {
    let half = (span / 2) as usize;
    let dt = f64::from(span) / frame_rate;
    (0..positions.len())
        .map(|t| {
            if t < half || t + half >= positions.len() {
                return None;
            }
            Some((positions[t + half]? - positions[t - half]?) / dt)
        })
        .collect()
}

/// Centred difference of a scalar series over `span` frames.
pub fn derivative(series: &[Option<f64>], span: u32, frame_rate: f64) -> Vec<Option<f64>> {
    let half = (span / 2) as usize;
    let dt = f64::from(span) / frame_rate;
    (0..series.len())
        .map(|t| {
            if t < half || t + half >= series.len() {
                return None;
            }
            Some((series[t + half]? - series[t - half]?) / dt)
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Speed, velocity and acceleration of one player, with physically
/// impossible samples masked.
pub fn player_kinematics(
    positions: &[Option<Position>],
    config: &KinematicsConfig,
    frame_rate: f64,
) -> Vec<PlayerKinematics> {
    let velocities = velocity(positions, config.speed_span, frame_rate);
    let speeds: Vec<Option<f64>> = velocities.iter().map(|v| v.map(|v| v.norm())).collect();
    let accelerations = derivative(&speeds, config.acc_span, frame_rate);

    velocities
        .iter()
        .zip(&speeds)
        .zip(&accelerations)
        .map(|((v, speed), acc)| {
            let speed = speed.map(round2);
            let acc = acc.map(round2);

            let too_fast = speed.is_some_and(|s| s > config.max_player_speed);
            let beyond_limit = matches!(
                (speed, acc),
                (Some(s), Some(a)) if a >= config.acc_limit_intercept - config.acc_limit_slope * s
            );
            if too_fast || beyond_limit {
                return PlayerKinematics::default();
            }

            PlayerKinematics {
                speed_norm: speed,
                vx: v.map(|v| round2(v.x)),
                vy: v.map(|v| round2(v.y)),
                acc_norm: acc,
            }
        })
        .collect()
}

/// Signed ball speed change used to locate kicks.
pub fn ball_refine_acc(
    positions: &[Option<Position>],
    config: &KinematicsConfig,
    frame_rate: f64,
) -> Vec<Option<f64>> {
    let speeds: Vec<Option<f64>> = velocity(positions, config.speed_span, frame_rate)
        .into_iter()
        .map(|v| v.map(|v| v.norm()))
        .collect();
    derivative(&speeds, config.refine_acc_span, frame_rate)
}
