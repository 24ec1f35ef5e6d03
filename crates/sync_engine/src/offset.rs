//! Offset estimation
//!
//! One offset per period: the tracking frame at which the provider clock
//! reads zero, so that `tracking frame = round(timestamp * fps) + offset`.
//!
//! Candidates around the period's first tracked frame are scored by a
//! quantile of per-pass player-ball distances. Holding the ball before a pass
//! makes that score flat over a range of candidates; the range is resolved
//! with kick anchors located on the tracking side.

use contracts::{Event, EventKind, OffsetConfig, OffsetSource, PeriodBounds, PeriodOffset, PlayerId, SyncConfig};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::index::TrackingIndex;
use crate::refine::find_kick;

/// Pass usable for alignment: player with a tracking column and the frame
/// count implied by its provider timestamp.
#[derive(Debug, Clone, Copy)]
struct Sample {
    player: PlayerId,
    implied: i64,
}

/// Nearest-rank quantile of an unsorted series.
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (q * values.len() as f64).ceil() as usize;
    Some(values[rank.clamp(1, values.len()) - 1])
}

/// Per-period offset search
#[derive(Debug, Clone, Copy)]
pub struct OffsetEstimator<'a> {
    index: &'a TrackingIndex,
    config: &'a SyncConfig,
}

impl<'a> OffsetEstimator<'a> {
    pub fn new(index: &'a TrackingIndex, config: &'a SyncConfig) -> Self {
        Self { index, config }
    }

    fn offset_config(&self) -> &OffsetConfig {
        &self.config.offset
    }

    /// Estimate every tracked period in order.
    ///
    /// Periods with too few usable passes borrow the drift of the previous
    /// period with an offset. Fails when no period could be estimated.
    #[instrument(name = "offset_estimate_all", skip_all, fields(events = events.len()))]
    pub fn estimate_all(&self, events: &[Event]) -> Result<Vec<PeriodOffset>> {
        let mut offsets: Vec<PeriodOffset> = Vec::new();

        for bounds in self.index.periods() {
            let previous = offsets
                .iter()
                .rev()
                .find_map(|p| p.drift().map(|d| (p.period, d)));
            let period_events = events.iter().filter(|e| e.period == bounds.period);
            let offset = self.estimate_period(bounds, period_events, previous);

            match &offset.source {
                OffsetSource::Estimated { score_m, sample_size } => info!(
                    period = bounds.period,
                    offset = offset.offset,
                    drift = offset.drift(),
                    score_m,
                    sample_size,
                    "period offset estimated"
                ),
                OffsetSource::Fallback { usable_events, required_events, from_period } => warn!(
                    period = bounds.period,
                    offset = offset.offset,
                    usable_events,
                    required_events,
                    from_period,
                    "too few usable passes, period offset falls back"
                ),
                OffsetSource::Failed { best_score_m, max_score_m } => warn!(
                    period = bounds.period,
                    best_score_m,
                    max_score_m,
                    "no viable offset, period left unsynchronized"
                ),
            }
            if let Some(o) = offset.offset {
                metrics::gauge!("event_sync_period_offset_frames", "period" => bounds.period.to_string())
                    .set(o as f64);
            }
            offsets.push(offset);
        }

        if !offsets.iter().any(PeriodOffset::is_estimated) {
            return Err(SyncError::NoEstimablePeriod {
                periods: offsets.iter().map(|p| p.period).collect(),
            });
        }
        Ok(offsets)
    }

    /// Estimate one period.
    pub fn estimate_period<'e>(
        &self,
        bounds: &PeriodBounds,
        events: impl Iterator<Item = &'e Event>,
        previous: Option<(u8, i64)>,
    ) -> PeriodOffset {
        let samples = self.samples(events);
        let required = self.offset_config().min_events(bounds.period);

        let nominal = i64::from(bounds.first_frame);
        if samples.len() < required {
            let (from_period, drift) = match previous {
                Some((period, drift)) => (Some(period), drift),
                None => (None, self.offset_config().default_drift_frames),
            };
            return PeriodOffset {
                period: bounds.period,
                bounds: *bounds,
                offset: Some(nominal + drift),
                source: OffsetSource::Fallback {
                    usable_events: samples.len(),
                    required_events: required,
                    from_period,
                },
            };
        }

        match self.search(bounds, &samples) {
            Ok((offset, score_m)) => PeriodOffset {
                period: bounds.period,
                bounds: *bounds,
                offset: Some(offset),
                source: OffsetSource::Estimated {
                    score_m,
                    sample_size: samples.len(),
                },
            },
            Err(SyncError::NoViableOffset {
                best_score_m,
                max_score_m,
                ..
            }) => PeriodOffset {
                period: bounds.period,
                bounds: *bounds,
                offset: None,
                source: OffsetSource::Failed {
                    best_score_m,
                    max_score_m,
                },
            },
            Err(other) => {
                warn!(period = bounds.period, error = %other, "offset search aborted");
                PeriodOffset {
                    period: bounds.period,
                    bounds: *bounds,
                    offset: None,
                    source: OffsetSource::Failed {
                        best_score_m: f64::INFINITY,
                        max_score_m: self.offset_config().max_score_m,
                    },
                }
            }
        }
    }

    fn samples<'e>(&self, events: impl Iterator<Item = &'e Event>) -> Vec<Sample> {
        let fps = self.config.frame_rate;
        let samples: Vec<Sample> = events
            .filter(|e| e.kind == EventKind::Pass)
            .filter_map(|e| {
                let player = e.player_id.filter(|p| self.index.has_player(*p))?;
                Some(Sample {
                    player,
                    implied: e.frames_since_kickoff(fps),
                })
            })
            .collect();

        let cap = self.offset_config().max_sample_events;
        if cap == 0 || samples.len() <= cap {
            return samples;
        }
        let stride = samples.len().div_ceil(cap);
        samples.into_iter().step_by(stride).collect()
    }

    /// Minimum detected player-ball distance around the implied frame.
    fn event_score(&self, sample: &Sample, offset: i64) -> f64 {
        let config = self.offset_config();
        let centre = sample.implied + offset;
        let tolerance = i64::from(config.tolerance_frames);
        (centre - tolerance..=centre + tolerance)
            .filter_map(|f| self.index.detected_distance(sample.player, f))
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(config.missing_distance_m)
    }

    fn candidate_score(&self, samples: &[Sample], offset: i64) -> f64 {
        let mut scores: Vec<f64> = samples.iter().map(|s| self.event_score(s, offset)).collect();
        quantile(&mut scores, self.offset_config().score_quantile)
            .unwrap_or(self.offset_config().missing_distance_m)
    }

    #[instrument(name = "offset_search", skip_all, fields(period = bounds.period, samples = samples.len()))]
    fn search(&self, bounds: &PeriodBounds, samples: &[Sample]) -> Result<(i64, f64)> {
        let config = self.offset_config();
        let nominal = i64::from(bounds.first_frame);
        let radius = (config.search_radius_s * self.config.frame_rate).round() as i64;

        let scored: Vec<(i64, f64)> = (nominal - radius..=nominal + radius)
            .into_par_iter()
            .map(|offset| (offset, self.candidate_score(samples, offset)))
            .collect();

        let best = scored
            .iter()
            .map(|(_, s)| *s)
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(f64::INFINITY);
        metrics::histogram!("event_sync_offset_score_m").record(best);

        if best > config.max_score_m {
            return Err(SyncError::NoViableOffset {
                period: bounds.period,
                best_score_m: best,
                max_score_m: config.max_score_m,
            });
        }

        let plateau: Vec<i64> = scored
            .iter()
            .filter(|(_, s)| *s <= best + config.plateau_tolerance_m)
            .map(|(o, _)| *o)
            .collect();
        let simplest = |o: &i64| ((o - nominal).abs(), *o);
        let reference = plateau.iter().copied().min_by_key(simplest).unwrap_or(nominal);

        let anchors = self.anchors(bounds, samples, reference);
        debug!(
            best_score_m = best,
            plateau = plateau.len(),
            reference,
            anchors = anchors.len(),
            "offset plateau"
        );
        if anchors.is_empty() {
            return Ok((reference, self.candidate_score(samples, reference)));
        }

        let chosen = plateau
            .iter()
            .copied()
            .min_by_key(|&o| {
                let mut deviations: Vec<i64> =
                    anchors.iter().map(|(implied, anchor)| (anchor - implied - o).abs()).collect();
                deviations.sort_unstable();
                (deviations[(deviations.len() - 1) / 2], simplest(&o))
            })
            .unwrap_or(reference);

        Ok((chosen, self.candidate_score(samples, chosen)))
    }

    /// Kick frame of each sampled pass near its reference-implied frame.
    fn anchors(&self, bounds: &PeriodBounds, samples: &[Sample], reference: i64) -> Vec<(i64, i64)> {
        let radius = i64::from(self.offset_config().anchor_radius_frames);
        samples
            .par_iter()
            .filter_map(|s| {
                let centre = s.implied + reference;
                let (start, end) = bounds.clip(centre - radius, centre + radius)?;
                let anchor = find_kick(
                    self.index,
                    s.player,
                    i64::from(start),
                    i64::from(end),
                    &self.config.refine,
                )
                .anchor()?;
                Some((s.implied, anchor))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::{MockMatch, MockMatchConfig, MockPeriod};

    fn setup(config: &MockMatchConfig) -> (MockMatch, TrackingIndex) {
        let mock = MockMatch::generate(config);
        let index =
            TrackingIndex::build(mock.frames.clone(), &SyncConfig::default()).unwrap();
        (mock, index)
    }

    #[test]
    fn test_quantile_nearest_rank() {
        assert_eq!(quantile(&mut [3.0, 1.0, 2.0], 0.5), Some(2.0));
        assert_eq!(quantile(&mut [4.0, 1.0, 3.0, 2.0], 0.5), Some(2.0));
        assert_eq!(quantile(&mut [5.0], 0.0), Some(5.0));
        assert_eq!(quantile(&mut [], 0.5), None);
    }

    #[test]
    fn test_recovers_exact_drift() {
        let config = MockMatchConfig::default();
        let (mock, index) = setup(&config);
        let sync = SyncConfig::default();
        let offsets = OffsetEstimator::new(&index, &sync)
            .estimate_all(&mock.events)
            .unwrap();

        assert_eq!(offsets.len(), 2);
        for (offset, period) in offsets.iter().zip(&config.periods) {
            assert!(offset.is_estimated());
            assert_eq!(offset.drift(), Some(period.drift_frames), "period {}", period.period);
        }
    }

    #[test]
    fn test_drift_with_jitter_stays_close() {
        let config = MockMatchConfig {
            jitter_s: 0.2,
            ..Default::default()
        };
        let (mock, index) = setup(&config);
        let sync = SyncConfig::default();
        let offsets = OffsetEstimator::new(&index, &sync)
            .estimate_all(&mock.events)
            .unwrap();

        for (offset, period) in offsets.iter().zip(&config.periods) {
            let drift = offset.drift().unwrap();
            assert!((drift - period.drift_frames).abs() <= 4, "period {} drift {drift}", period.period);
        }
    }

    #[test]
    fn test_fallback_borrows_previous_drift() {
        let config = MockMatchConfig {
            periods: vec![
                MockPeriod {
                    period: 1,
                    first_frame: 100,
                    drift_frames: 12,
                    passes: 15,
                },
                MockPeriod {
                    period: 2,
                    first_frame: 1000,
                    drift_frames: -8,
                    passes: 4,
                },
            ],
            ..Default::default()
        };
        let (mock, index) = setup(&config);
        let sync = SyncConfig::default();
        let offsets = OffsetEstimator::new(&index, &sync)
            .estimate_all(&mock.events)
            .unwrap();

        let second = &offsets[1];
        assert_eq!(second.drift(), Some(12));
        assert_eq!(
            second.source,
            OffsetSource::Fallback {
                usable_events: 4,
                required_events: 10,
                from_period: Some(1),
            }
        );
    }

    #[test]
    fn test_failed_period_without_contact() {
        let (mut mock, index) = setup(&MockMatchConfig::default());
        // Attribute every pass to a player who never touches the ball.
        for event in &mut mock.events {
            if event.period == 2 && event.kind == EventKind::Pass {
                event.player_id = Some(13);
            }
        }
        let sync = SyncConfig {
            offset: OffsetConfig {
                search_radius_s: 2.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let offsets = OffsetEstimator::new(&index, &sync)
            .estimate_all(&mock.events)
            .unwrap();

        assert!(offsets[0].is_estimated());
        assert!(matches!(offsets[1].source, OffsetSource::Failed { .. }));
        assert_eq!(offsets[1].offset, None);
    }

    #[test]
    fn test_no_estimable_period() {
        let (mut mock, index) = setup(&MockMatchConfig::default());
        mock.events.retain(|e| e.kind != EventKind::Pass);
        let sync = SyncConfig::default();
        let err = OffsetEstimator::new(&index, &sync)
            .estimate_all(&mock.events)
            .unwrap_err();
        assert!(matches!(err, SyncError::NoEstimablePeriod { .. }));
    }

    #[test]
    fn test_deterministic() {
        let config = MockMatchConfig {
            jitter_s: 0.3,
            ..Default::default()
        };
        let (mock, index) = setup(&config);
        let sync = SyncConfig::default();
        let estimator = OffsetEstimator::new(&index, &sync);
        assert_eq!(
            estimator.estimate_all(&mock.events).unwrap(),
            estimator.estimate_all(&mock.events).unwrap()
        );
    }
}
