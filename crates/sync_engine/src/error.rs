//! Sync engine error types

use contracts::ContractError;
use thiserror::Error;

/// Match-level synchronization failure
///
/// Per-event and per-period problems never surface here; they are recorded
/// as flags on the results.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The tracking stream holds no frame
    #[error("tracking stream is empty")]
    EmptyTracking,

    /// Frame numbers spread over more than the configured match length
    #[error("tracking frames {first}..={last} span more than {max_frames} frames")]
    TrackingSpan { first: u32, last: u32, max_frames: u64 },

    /// Tracking periods overlap or are out of order, or event kick-offs
    /// land out of tracking order
    #[error("period order violated: {message}")]
    PeriodOrder { message: String },

    /// No period could be aligned from tracking evidence
    #[error("no period offset could be estimated (periods tried: {periods:?})")]
    NoEstimablePeriod { periods: Vec<u8> },

    /// The search for a single period found no acceptable alignment
    #[error("no viable offset for period {period}: best score {best_score_m:.2} m exceeds {max_score_m:.2} m")]
    NoViableOffset {
        period: u8,
        best_score_m: f64,
        max_score_m: f64,
    },
}

impl SyncError {
    pub fn period_order(message: impl Into<String>) -> Self {
        Self::PeriodOrder {
            message: message.into(),
        }
    }
}

impl From<SyncError> for ContractError {
    fn from(err: SyncError) -> Self {
        ContractError::Other(err.to_string())
    }
}

/// Sync engine Result alias
pub type Result<T> = std::result::Result<T, SyncError>;
