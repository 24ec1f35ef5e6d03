//! Pipeline orchestrator - coordinates all components.
//!
//! Inputs are loaded asynchronously, the engine runs on the blocking pool,
//! and the finished artifacts are handed to the dispatcher sinks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{SyncArtifacts, SyncConfig};
use dispatcher::DispatcherConfig;
use ingestion::{EventAdapter, MatchData};
use observability::RunQualityAggregator;
use reporting::ReportGenerator;
use sync_engine::SyncEngine;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Synchronization settings, already merged with CLI overrides
    pub sync: SyncConfig,

    /// Tracking data path (JSON Lines or JSON array)
    pub tracking_path: PathBuf,

    /// Directory receiving the artifacts
    pub output_dir: PathBuf,

    /// Per-sink queue capacity
    pub queue_capacity: usize,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    #[instrument(
        name = "pipeline_run",
        skip_all,
        fields(provider = %adapter.provider(), tracking = %self.config.tracking_path.display())
    )]
    pub async fn run(self, adapter: &dyn EventAdapter, match_data: MatchData) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let provider = adapter.provider();

        info!("Loading tracking data...");
        let frames = ingestion::load_tracking(&self.config.tracking_path)
            .await
            .context("Failed to load tracking data")?;
        info!(frames = frames.len(), "Tracking data loaded");

        let events = ingestion::standardize_events(adapter, &match_data)
            .context("Failed to standardize provider events")?;
        info!(events = events.len(), "Events standardized");

        let context = Arc::new(match_data.to_context(self.config.sync.frame_rate));
        let events = Arc::new(events);
        let engine = SyncEngine::new(self.config.sync.clone());

        info!(match_label = %match_data.label(), "Synchronizing...");
        let (index, outcome) = {
            let engine = engine.clone();
            let context = Arc::clone(&context);
            let events = Arc::clone(&events);
            tokio::task::spawn_blocking(move || -> Result<_> {
                let index = engine.index(frames)?;
                let outcome = engine.run(&context, &index, &events)?;
                Ok((index, outcome))
            })
            .await
            .map_err(|e| CliError::pipeline_execution(format!("engine task failed: {e}")))??
        };

        for period in &outcome.periods {
            info!(
                period = period.period,
                offset = ?period.offset,
                drift = ?period.drift(),
                source = ?period.source,
                "Period offset"
            );
        }

        let warnings = observability::quality_warnings(engine.config(), &events, &outcome);
        observability::log_warnings(&warnings);

        let mut quality = RunQualityAggregator::new();
        quality.update(&events, &outcome);

        let artifacts = ReportGenerator::new(provider, &context).generate(&events, &outcome, &index);
        info!(
            rows = artifacts.by_event.len(),
            event_types = artifacts.by_event_type.len(),
            freeze_frames = artifacts.freeze_frames.len(),
            "Reports generated"
        );

        let sinks = self.dispatch(artifacts).await?;

        let stats = PipelineStats {
            provider,
            match_label: match_data.label(),
            events: events.len(),
            applicable: outcome.applicable_count(),
            matched: outcome.matched_count(),
            periods: outcome.periods,
            warnings: warnings.len(),
            quality: quality.summary(),
            sinks,
            output_dir: self.config.output_dir,
            duration: start_time.elapsed(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            match_rate = format!("{:.1}", stats.match_rate()),
            "Pipeline complete"
        );

        Ok(stats)
    }

    /// Hand the artifacts to the sinks and wait for them to flush
    async fn dispatch(
        &self,
        artifacts: SyncArtifacts,
    ) -> Result<Vec<(String, dispatcher::MetricsSnapshot)>> {
        let (tx, rx) = mpsc::channel::<SyncArtifacts>(1);
        let dispatcher_config = DispatcherConfig {
            queue_capacity: self.config.queue_capacity.max(1),
            ..DispatcherConfig::new(&self.config.output_dir)
        };

        let dispatcher = dispatcher::create_dispatcher(dispatcher_config, rx)
            .await
            .context("Failed to create dispatcher")?;
        let handle = dispatcher.spawn();
        info!(output_dir = %self.config.output_dir.display(), "Dispatcher started");

        if tx.send(artifacts).await.is_err() {
            warn!("Dispatcher channel closed before artifacts were sent");
        }
        drop(tx);

        let sinks = handle
            .await
            .map_err(|e| CliError::pipeline_execution(format!("dispatcher task failed: {e}")))?
            .context("Failed to write artifacts")?;
        Ok(sinks)
    }
}
