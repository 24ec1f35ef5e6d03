//! Synchronization configuration contracts shared across crates.
//!
//! Every field has a default, so an empty TOML/JSON document is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level synchronization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SyncConfig {
    /// Tracking frame rate (frames per second)
    #[validate(range(min = 1.0, max = 1000.0))]
    pub frame_rate: f64,

    /// Longest tracking stream accepted, first to last frame (seconds)
    #[validate(range(min = 60.0))]
    pub max_tracking_span_s: f64,

    /// Extra event type names that are never matchable (e.g. "Card"),
    /// on top of each provider's built-in list
    pub non_matchable_types: Vec<String>,

    #[validate(nested)]
    pub offset: OffsetConfig,

    #[validate(nested)]
    pub refine: RefineConfig,

    #[validate(nested)]
    pub validation: ValidationConfig,

    #[validate(nested)]
    pub kinematics: KinematicsConfig,

    #[validate(nested)]
    pub warnings: WarningConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            max_tracking_span_s: 14_400.0,
            non_matchable_types: Vec::new(),
            offset: OffsetConfig::default(),
            refine: RefineConfig::default(),
            validation: ValidationConfig::default(),
            kinematics: KinematicsConfig::default(),
            warnings: WarningConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn is_non_matchable(&self, type_name: &str) -> bool {
        self.non_matchable_types.iter().any(|t| t == type_name)
    }
}

/// Offset estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OffsetConfig {
    /// Half-width of the candidate range around the nominal period start (seconds)
    #[validate(range(min = 0.0))]
    pub search_radius_s: f64,
    /// Half-width of the per-event minimum-distance window (frames)
    pub tolerance_frames: u32,
    /// Quantile of per-event distances used as candidate score
    #[validate(range(min = 0.0, max = 1.0))]
    pub score_quantile: f64,
    /// Best score above this fails the period (metres)
    #[validate(range(min = 0.0))]
    pub max_score_m: f64,
    /// Distance charged to an event with no usable frame (metres)
    #[validate(range(min = 0.0))]
    pub missing_distance_m: f64,
    /// Candidates within this margin of the best score are re-ranked (metres)
    #[validate(range(min = 0.0))]
    pub plateau_tolerance_m: f64,
    /// Search radius for per-event kick anchors during re-ranking (frames)
    #[validate(range(min = 1))]
    pub anchor_radius_frames: u32,
    /// Minimum usable events in periods 1-2
    #[validate(range(min = 1))]
    pub min_events_regular: usize,
    /// Minimum usable events in extra time
    #[validate(range(min = 1))]
    pub min_events_extra_time: usize,
    /// Cap on sampled events per period, 0 for no cap
    pub max_sample_events: usize,
    /// Drift applied when a period falls back without a previous estimate (frames)
    pub default_drift_frames: i64,
    /// Offsets below this trigger a warning (frames)
    pub negative_start_warning_frames: i64,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            search_radius_s: 60.0,
            tolerance_frames: 2,
            score_quantile: 0.5,
            max_score_m: 5.0,
            missing_distance_m: 100.0,
            plateau_tolerance_m: 0.25,
            anchor_radius_frames: 25,
            min_events_regular: 10,
            min_events_extra_time: 5,
            max_sample_events: 0,
            default_drift_frames: 0,
            negative_start_warning_frames: -100,
        }
    }
}

impl OffsetConfig {
    pub fn min_events(&self, period: u8) -> usize {
        if period <= 2 {
            self.min_events_regular
        } else {
            self.min_events_extra_time
        }
    }
}

/// Frame refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RefineConfig {
    /// Refine pass/shot events; force-refined events are refined regardless
    pub enabled: bool,
    /// Window radius when the event carries none (frames)
    #[validate(range(min = 1))]
    pub window_radius: u32,
    /// Player-ball proximity defining the contact sub-window (metres)
    #[validate(range(min = 0.0))]
    pub proximity_m: f64,
    /// Minimum share of window frames with the player detected
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_player_detected_ratio: f64,
    /// Minimum share of sub-window frames with the ball detected
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_ball_detected_ratio: f64,
    /// Peak ball acceleration below this is treated as flat (m/s²)
    #[validate(range(min = 0.0))]
    pub min_ball_acc: f64,
    /// Frames before the end of the contact sub-window searched for the kick
    pub last_touch_frames: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_radius: 10,
            proximity_m: 3.0,
            min_player_detected_ratio: 0.5,
            min_ball_detected_ratio: 0.5,
            min_ball_acc: 7.0,
            last_touch_frames: 5,
        }
    }
}

/// Match validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ValidationConfig {
    /// Half-width of the validation window (frames)
    pub window_radius: u32,
    /// Player-ball distance accepted as a match (metres)
    #[validate(range(min = 0.0))]
    pub proximity_m: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            window_radius: 5,
            proximity_m: 3.5,
        }
    }
}

/// Finite-difference kinematics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Centred span for velocity (frames, even)
    #[validate(range(min = 2))]
    pub speed_span: u32,
    /// Centred span for acceleration (frames, even)
    #[validate(range(min = 2))]
    pub acc_span: u32,
    /// Centred span for the ball acceleration used by the refiner (frames, even)
    #[validate(range(min = 2))]
    pub refine_acc_span: u32,
    /// Player speeds above this are discarded (m/s)
    #[validate(range(min = 0.0))]
    pub max_player_speed: f64,
    /// Acceleration limit at zero speed (m/s²)
    pub acc_limit_intercept: f64,
    /// Acceleration limit decrease per m/s of speed
    pub acc_limit_slope: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            speed_span: 2,
            acc_span: 8,
            refine_acc_span: 2,
            max_player_speed: 10.5,
            acc_limit_intercept: 9.1,
            acc_limit_slope: 0.6354,
        }
    }
}

/// Data-quality warning thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WarningConfig {
    /// Match rate over applicable events below this is reported (percent)
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_match_rate_pct: f64,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            min_match_rate_pct: 40.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"refine": {"enabled": false}, "non_matchable_types": ["Card"]}"#)
                .unwrap();
        assert!(!config.refine.enabled);
        assert_eq!(config.refine.window_radius, 10);
        assert_eq!(config.validation.proximity_m, 3.5);
        assert!(config.is_non_matchable("Card"));
        assert!(!config.is_non_matchable("Pass"));
    }

    #[test]
    fn test_out_of_range_quantile_rejected() {
        let mut config = SyncConfig::default();
        config.offset.score_quantile = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_events_by_period() {
        let offset = OffsetConfig::default();
        assert_eq!(offset.min_events(1), 10);
        assert_eq!(offset.min_events(2), 10);
        assert_eq!(offset.min_events(3), 5);
    }
}
