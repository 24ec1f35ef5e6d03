//! Synchronization output contracts
//!
//! Per-period offsets and per-event `SyncResult`s produced by the engine and
//! consumed by the report generator.

use serde::{Serialize, Serializer};

use crate::PeriodBounds;

/// Projected event coordinate: a number, or `"unknown"` when the location or
/// the attacking side is not known.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Projected {
    Value(f64),
    #[default]
    Unknown,
}

impl Projected {
    pub fn value(&self) -> Option<f64> {
        match self {
            Projected::Value(v) => Some(*v),
            Projected::Unknown => None,
        }
    }
}

impl Serialize for Projected {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Projected::Value(v) => serializer.serialize_f64(*v),
            Projected::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Synchronization verdict for one event
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SyncResult {
    /// Assigned tracking frame, unset without tracking coverage
    pub frame: Option<u32>,
    /// Offset-implied frame before refinement
    pub implied_frame: Option<u32>,
    /// Player and ball evidence supports the assigned frame
    pub is_matched: bool,
    pub is_player_detected: bool,
    pub has_player_id_attached: bool,
    pub frame_tracking_data_available: bool,
    pub is_matched_applicable: bool,
    pub projected_x: Projected,
    pub projected_y: Projected,
}

impl SyncResult {
    /// `is_matched` as reported: absent when matching does not apply.
    pub fn reported_is_matched(&self) -> Option<bool> {
        self.is_matched_applicable.then_some(self.is_matched)
    }

    /// Frame moved by the refiner.
    pub fn was_refined(&self) -> bool {
        matches!((self.frame, self.implied_frame), (Some(a), Some(b)) if a != b)
    }
}

/// How a period offset was obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OffsetSource {
    /// Searched and accepted
    Estimated { score_m: f64, sample_size: usize },
    /// Too few usable events; drift borrowed from `from_period` or the
    /// configured default when `None`
    Fallback {
        usable_events: usize,
        required_events: usize,
        from_period: Option<u8>,
    },
    /// Searched but no candidate aligned well enough
    Failed { best_score_m: f64, max_score_m: f64 },
}

/// Offset decision for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodOffset {
    pub period: u8,
    pub bounds: PeriodBounds,
    /// Tracking frame of the provider's period kick-off
    pub offset: Option<i64>,
    #[serde(flatten)]
    pub source: OffsetSource,
}

impl PeriodOffset {
    /// Offset relative to the first tracked frame of the period.
    pub fn drift(&self) -> Option<i64> {
        self.offset.map(|o| o - i64::from(self.bounds.first_frame))
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self.source, OffsetSource::Estimated { .. })
    }
}

/// Engine output for one match
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SyncOutcome {
    pub periods: Vec<PeriodOffset>,
    /// One result per input event, same order
    pub results: Vec<SyncResult>,
}

impl SyncOutcome {
    pub fn period(&self, period: u8) -> Option<&PeriodOffset> {
        self.periods.iter().find(|p| p.period == period)
    }

    pub fn matched_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.reported_is_matched() == Some(true))
            .count()
    }

    pub fn applicable_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_matched_applicable).count()
    }
}
