//! Run-quality aggregation
//!
//! Collects per-run statistics from finished sync outcomes for the summary
//! printed after a run.

use std::collections::BTreeMap;

use contracts::{Event, OffsetSource, SyncOutcome};

/// Aggregates the quality of one or more runs
#[derive(Debug, Clone, Default)]
pub struct RunQualityAggregator {
    pub total_events: u64,
    pub applicable: u64,
    pub matched: u64,
    pub refined: u64,
    /// Events whose frame is unset
    pub unassigned: u64,
    /// Events with a provider player id but no canonical player
    pub unmapped_players: u64,
    /// `|frame - implied|` over refined events
    pub refine_shift: RunningStats,
    /// Period drift (frames) per period, over estimated and fallback periods
    pub drift_stats: BTreeMap<u8, RunningStats>,
    /// Periods per offset source
    pub period_sources: BTreeMap<&'static str, u64>,
}

impl RunQualityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events and results are paired by position.
    pub fn update(&mut self, events: &[Event], outcome: &SyncOutcome) {
        for (event, result) in events.iter().zip(&outcome.results) {
            self.total_events += 1;
            match result.reported_is_matched() {
                Some(true) => {
                    self.applicable += 1;
                    self.matched += 1;
                }
                Some(false) => self.applicable += 1,
                None => {}
            }
            if result.frame.is_none() {
                self.unassigned += 1;
            }
            if let (Some(frame), Some(implied)) = (result.frame, result.implied_frame) {
                if frame != implied {
                    self.refined += 1;
                    self.refine_shift
                        .push((i64::from(frame) - i64::from(implied)).abs() as f64);
                }
            }
            if event.has_provider_player_id() && event.player_id.is_none() {
                self.unmapped_players += 1;
            }
        }

        for period in &outcome.periods {
            *self.period_sources.entry(source_name(&period.source)).or_insert(0) += 1;
            if let Some(drift) = period.drift() {
                self.drift_stats
                    .entry(period.period)
                    .or_default()
                    .push(drift as f64);
            }
        }
    }

    /// Generate summary report
    pub fn summary(&self) -> RunQualitySummary {
        RunQualitySummary {
            total_events: self.total_events,
            applicable: self.applicable,
            matched: self.matched,
            refined: self.refined,
            unassigned: self.unassigned,
            unmapped_players: self.unmapped_players,
            match_rate: if self.applicable > 0 {
                self.matched as f64 / self.applicable as f64 * 100.0
            } else {
                0.0
            },
            refine_shift: StatsSummary::from(&self.refine_shift),
            period_drift: self
                .drift_stats
                .iter()
                .map(|(period, stats)| (*period, StatsSummary::from(stats)))
                .collect(),
            period_sources: self.period_sources.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn source_name(source: &OffsetSource) -> &'static str {
    match source {
        OffsetSource::Estimated { .. } => "estimated",
        OffsetSource::Fallback { .. } => "fallback",
        OffsetSource::Failed { .. } => "failed",
    }
}

/// Run-quality summary
#[derive(Debug, Clone, Default)]
pub struct RunQualitySummary {
    pub total_events: u64,
    pub applicable: u64,
    pub matched: u64,
    pub refined: u64,
    pub unassigned: u64,
    pub unmapped_players: u64,
    pub match_rate: f64,
    pub refine_shift: StatsSummary,
    pub period_drift: BTreeMap<u8, StatsSummary>,
    pub period_sources: BTreeMap<&'static str, u64>,
}

impl std::fmt::Display for RunQualitySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Event Sync Quality Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(
            f,
            "Matched: {} / {} applicable ({:.1}%)",
            self.matched, self.applicable, self.match_rate
        )?;
        writeln!(f, "Refined: {}", self.refined)?;
        writeln!(f, "Without frame: {}", self.unassigned)?;
        writeln!(f, "Unmapped provider players: {}", self.unmapped_players)?;
        writeln!(f, "Refine shift (frames): {}", self.refine_shift)?;

        if !self.period_drift.is_empty() {
            writeln!(f, "Period drift (frames):")?;
            for (period, stats) in &self.period_drift {
                writeln!(f, "  period {}: {}", period, stats)?;
            }
        }
        if !self.period_sources.is_empty() {
            writeln!(f, "Period offsets:")?;
            for (source, count) in &self.period_sources {
                writeln!(f, "  {}: {}", source, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
