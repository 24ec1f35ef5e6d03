//! Match validation
//!
//! Decides whether tracking evidence supports an assigned frame. Missing
//! data is reported through the verdict, never as an error.

use contracts::{PlayerId, ValidationConfig};

use crate::index::TrackingIndex;

/// Tracking evidence around an assigned frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    /// Some window frame has a detected ball within reach of the player
    pub is_matched: bool,
    /// The player is detected in some window frame
    pub is_player_detected: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchValidator<'a> {
    index: &'a TrackingIndex,
    config: &'a ValidationConfig,
}

impl<'a> MatchValidator<'a> {
    pub fn new(index: &'a TrackingIndex, config: &'a ValidationConfig) -> Self {
        Self { index, config }
    }

    /// Inspect `frame ± window_radius` for `player`.
    pub fn validate(&self, player: PlayerId, frame: i64) -> Verdict {
        let radius = i64::from(self.config.window_radius);
        let window = frame - radius..=frame + radius;

        Verdict {
            is_matched: window.clone().any(|f| {
                self.index
                    .detected_distance(player, f)
                    .is_some_and(|d| d <= self.config.proximity_m)
            }),
            is_player_detected: window.into_iter().any(|f| self.index.player_detected(player, f)),
        }
    }
}
