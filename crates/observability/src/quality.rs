//! Data-quality warnings
//!
//! Conditions that do not stop a run but usually point at a problem in the
//! video, the events or the tracking data.

use std::collections::BTreeSet;
use std::fmt;

use contracts::{Event, OffsetSource, ProviderId, SyncConfig, SyncOutcome};
use metrics::counter;
use tracing::warn;

/// One data-quality finding
#[derive(Debug, Clone, PartialEq)]
pub enum QualityWarning {
    /// Provider kick-off placed far before the first tracking frame
    NegativeStart { period: u8, offset: i64, threshold: i64 },
    /// Too few applicable events matched
    LowMatchRate { rate_pct: f64, min_pct: f64 },
    /// Provider player ids that did not map to a canonical player
    UnmappedPlayers { provider_ids: Vec<ProviderId> },
    /// Period offset borrowed instead of estimated
    PeriodFallback {
        period: u8,
        usable_events: usize,
        required_events: usize,
        from_period: Option<u8>,
    },
    /// Period left without an offset
    PeriodFailed { period: u8, best_score_m: f64 },
}

impl QualityWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            QualityWarning::NegativeStart { .. } => "negative_start",
            QualityWarning::LowMatchRate { .. } => "low_match_rate",
            QualityWarning::UnmappedPlayers { .. } => "unmapped_players",
            QualityWarning::PeriodFallback { .. } => "period_fallback",
            QualityWarning::PeriodFailed { .. } => "period_failed",
        }
    }
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityWarning::NegativeStart { period, offset, threshold } => write!(
                f,
                "period {period} starts at tracking frame {offset} (below {threshold}), check video, events or tracking data"
            ),
            QualityWarning::LowMatchRate { rate_pct, min_pct } => write!(
                f,
                "only {rate_pct:.1}% of applicable events matched (expected at least {min_pct:.1}%)"
            ),
            QualityWarning::UnmappedPlayers { provider_ids } => {
                let ids: Vec<&str> = provider_ids.iter().map(ProviderId::as_str).collect();
                write!(f, "provider player ids without mapping: {}", ids.join(", "))
            }
            QualityWarning::PeriodFallback {
                period,
                usable_events,
                required_events,
                from_period,
            } => {
                write!(
                    f,
                    "period {period}: {usable_events} usable passes (< {required_events}), offset "
                )?;
                match from_period {
                    Some(p) => write!(f, "reuses the drift of period {p}"),
                    None => write!(f, "uses the default drift"),
                }
            }
            QualityWarning::PeriodFailed { period, best_score_m } => write!(
                f,
                "period {period}: no viable offset (best score {best_score_m:.2} m), events left without frame"
            ),
        }
    }
}

/// Collect the warnings of one run. Events and results are paired by position.
pub fn quality_warnings(
    config: &SyncConfig,
    events: &[Event],
    outcome: &SyncOutcome,
) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();

    for period in &outcome.periods {
        match &period.source {
            OffsetSource::Fallback {
                usable_events,
                required_events,
                from_period,
            } => warnings.push(QualityWarning::PeriodFallback {
                period: period.period,
                usable_events: *usable_events,
                required_events: *required_events,
                from_period: *from_period,
            }),
            OffsetSource::Failed { best_score_m, .. } => warnings.push(QualityWarning::PeriodFailed {
                period: period.period,
                best_score_m: *best_score_m,
            }),
            OffsetSource::Estimated { .. } => {}
        }
        if let Some(offset) = period.offset {
            let threshold = config.offset.negative_start_warning_frames;
            if offset < threshold {
                warnings.push(QualityWarning::NegativeStart {
                    period: period.period,
                    offset,
                    threshold,
                });
            }
        }
    }

    let applicable = outcome.applicable_count();
    if applicable > 0 {
        let rate_pct = outcome.matched_count() as f64 / applicable as f64 * 100.0;
        let rate_pct = (rate_pct * 10.0).round() / 10.0;
        if rate_pct < config.warnings.min_match_rate_pct {
            warnings.push(QualityWarning::LowMatchRate {
                rate_pct,
                min_pct: config.warnings.min_match_rate_pct,
            });
        }
    }

    let unmapped: BTreeSet<&ProviderId> = events
        .iter()
        .filter(|e| e.has_provider_player_id() && e.player_id.is_none())
        .filter_map(|e| e.provider_player_id.as_ref())
        .collect();
    if !unmapped.is_empty() {
        warnings.push(QualityWarning::UnmappedPlayers {
            provider_ids: unmapped.into_iter().cloned().collect(),
        });
    }

    warnings
}

/// Emit every warning as a `warn` record and count it.
pub fn log_warnings(warnings: &[QualityWarning]) {
    for warning in warnings {
        counter!("event_sync_quality_warnings_total", "kind" => warning.kind()).increment(1);
        warn!(kind = warning.kind(), "{warning}");
    }
}
