//! Dispatcher - main loop for fan-out to sinks

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use contracts::SyncArtifacts;

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{CsvReportSink, FreezeFrameSink, LogSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Directory receiving the reports and the freeze frames
    pub output_dir: PathBuf,
    /// Per-sink queue capacity
    pub queue_capacity: usize,
    /// Also log a summary of every run
    pub log_summary: bool,
}

impl DispatcherConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            queue_capacity: 4,
            log_summary: true,
        }
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<SyncArtifacts>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<SyncArtifacts>) -> Self {
        Self { config, input_rx }
    }

    /// Create the sinks and start their workers
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(output_dir = %self.config.output_dir.display())
    )]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let config = &self.config;
        let csv = CsvReportSink::new("csv_reports", &config.output_dir)
            .map_err(|e| DispatcherError::sink_creation("csv_reports", e.to_string()))?;
        let freeze = FreezeFrameSink::new("freeze_frames", &config.output_dir)
            .map_err(|e| DispatcherError::sink_creation("freeze_frames", e.to_string()))?;

        let mut handles = vec![
            SinkHandle::spawn(csv, config.queue_capacity),
            SinkHandle::spawn(freeze, config.queue_capacity),
        ];
        if config.log_summary {
            handles.push(SinkHandle::spawn(LogSink::new("log"), config.queue_capacity));
        }

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }
}

/// Fans finished artifacts out to every sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<SyncArtifacts>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<SyncArtifacts>,
    ) -> Self {
        Self { handles, input_rx }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Returns once the input channel is closed and every sink has finished,
    /// with an error if any sink reported a failure.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Result<Vec<(String, MetricsSnapshot)>, DispatcherError> {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut runs: u64 = 0;
        while let Some(artifacts) = self.input_rx.recv().await {
            runs += 1;
            let artifacts = Arc::new(artifacts);
            for handle in &self.handles {
                if let Err(e) = handle.send(Arc::clone(&artifacts)).await {
                    error!(sink = handle.name(), error = %e, "Dispatch failed");
                    handle.metrics().inc_failure_count();
                }
            }
        }

        info!(runs, "Dispatcher input closed, shutting down");

        let mut snapshots = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            snapshots.push((name, handle.shutdown().await));
        }

        let failed: Vec<String> = snapshots
            .iter()
            .filter(|(_, s)| s.failure_count > 0)
            .map(|(name, _)| name.clone())
            .collect();
        if !failed.is_empty() {
            let failures = snapshots.iter().map(|(_, s)| s.failure_count).sum();
            return Err(DispatcherError::WriteFailures {
                sinks: failed,
                failures,
            });
        }

        info!("Dispatcher shutdown complete");
        Ok(snapshots)
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Result<Vec<(String, MetricsSnapshot)>, DispatcherError>> {
        tokio::spawn(self.run())
    }
}

/// Convenience function to create the standard dispatcher
#[instrument(name = "dispatcher_create", skip(config, input_rx))]
pub async fn create_dispatcher(
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<SyncArtifacts>,
) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(config, input_rx).build().await
}
