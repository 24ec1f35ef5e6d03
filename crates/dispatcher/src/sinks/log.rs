//! LogSink - logs a run summary via tracing

use contracts::{ArtifactSink, ContractError, SyncArtifacts};
use tracing::{info, instrument};

/// Sink that logs artifact summaries
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_summary(&self, artifacts: &SyncArtifacts) {
        let applicable = artifacts
            .by_event
            .iter()
            .filter(|r| r.is_matched.is_some())
            .count();
        let matched = artifacts
            .by_event
            .iter()
            .filter(|r| r.is_matched == Some(true))
            .count();

        info!(
            sink = %self.name,
            provider = %artifacts.provider,
            events = artifacts.by_event.len(),
            event_types = artifacts.by_event_type.len(),
            applicable,
            matched,
            freeze_frames = artifacts.freeze_frames.len(),
            "SyncArtifacts received"
        );
    }
}

impl ArtifactSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip(self, artifacts), fields(sink = %self.name))]
    async fn write(&mut self, artifacts: &SyncArtifacts) -> Result<(), ContractError> {
        self.log_summary(artifacts);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::sample_artifacts;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        assert!(sink.write(&sample_artifacts()).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
