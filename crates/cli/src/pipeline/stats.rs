//! Pipeline statistics and the end-of-run summary table.

use std::path::PathBuf;
use std::time::Duration;

use contracts::{OffsetSource, PeriodOffset, Provider};
use dispatcher::MetricsSnapshot;
use observability::RunQualitySummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub provider: Provider,

    /// "Home - Away"
    pub match_label: String,

    /// Standardized events
    pub events: usize,

    /// Events the validator could judge
    pub applicable: usize,

    /// Applicable events validated as matched
    pub matched: usize,

    /// Offset decision per tracked period
    pub periods: Vec<PeriodOffset>,

    /// Data-quality warnings raised
    pub warnings: usize,

    pub quality: RunQualitySummary,

    /// Per-sink write counters
    pub sinks: Vec<(String, MetricsSnapshot)>,

    pub output_dir: PathBuf,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Matched share of applicable events, in percent
    pub fn match_rate(&self) -> f64 {
        if self.applicable > 0 {
            (self.matched as f64 / self.applicable as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Synchronization Summary                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Match: {}", self.match_label);
        println!("   ├─ Provider: {}", self.provider);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Events: {}", self.events);
        println!(
            "   ├─ Matched: {} / {} applicable ({:.1}%)",
            self.matched,
            self.applicable,
            self.match_rate()
        );
        println!("   ├─ Refined: {}", self.quality.refined);
        println!("   └─ Warnings: {}", self.warnings);

        println!("\n⏱  Period Offsets");
        for (i, period) in self.periods.iter().enumerate() {
            let prefix = if i + 1 == self.periods.len() { "└─" } else { "├─" };
            println!("   {} {}", prefix, period_line(period));
        }

        if !self.sinks.is_empty() {
            println!("\n📤 Outputs ({})", self.output_dir.display());
            for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
                let prefix = if i + 1 == self.sinks.len() { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} rows in {:.1} ms, {} failed",
                    prefix,
                    name,
                    snapshot.rows_written,
                    snapshot.last_write.as_secs_f64() * 1000.0,
                    snapshot.failure_count
                );
            }
        }

        println!();
    }
}

fn period_line(period: &PeriodOffset) -> String {
    let offset = match (period.offset, period.drift()) {
        (Some(offset), Some(drift)) => format!("frame {offset} (drift {drift:+})"),
        _ => "none".to_string(),
    };
    let source = match &period.source {
        OffsetSource::Estimated { score_m, sample_size } => {
            format!("estimated, score {score_m:.2} m over {sample_size} events")
        }
        OffsetSource::Fallback {
            usable_events,
            required_events,
            from_period: Some(from),
        } => format!("fallback from period {from} ({usable_events}/{required_events} events)"),
        OffsetSource::Fallback {
            usable_events,
            required_events,
            from_period: None,
        } => format!("fallback to default drift ({usable_events}/{required_events} events)"),
        OffsetSource::Failed { best_score_m, max_score_m } => {
            format!("failed, best score {best_score_m:.2} m > {max_score_m:.2} m")
        }
    };
    format!("period {}: {} [{}]", period.period, offset, source)
}
