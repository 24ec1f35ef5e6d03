//! FreezeFrameSink - writes freeze frames as a JSON array

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ArtifactSink, ContractError, SyncArtifacts};
use tracing::{debug, instrument};

pub const FREEZE_FRAME_FILE: &str = "freeze_frame_format.json";

/// Sink writing `freeze_frame_format.json`
pub struct FreezeFrameSink {
    name: String,
    path: PathBuf,
}

impl FreezeFrameSink {
    pub fn new(name: impl Into<String>, output_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        fs::create_dir_all(output_dir.as_ref())?;
        Ok(Self {
            name: name.into(),
            path: output_dir.as_ref().join(FREEZE_FRAME_FILE),
        })
    }

    fn write_json(&self, artifacts: &SyncArtifacts) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(&mut writer, &artifacts.freeze_frames)?;
        writer.flush()
    }
}

impl ArtifactSink for FreezeFrameSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "freeze_frame_sink_write",
        skip(self, artifacts),
        fields(sink = %self.name, records = artifacts.freeze_frames.len())
    )]
    async fn write(&mut self, artifacts: &SyncArtifacts) -> Result<(), ContractError> {
        self.write_json(artifacts).map_err(|e| {
            ContractError::sink_write(&self.name, format!("{}: {e}", self.path.display()))
        })?;
        debug!(sink = %self.name, path = %self.path.display(), "freeze frames written");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::sample_artifacts;

    #[tokio::test]
    async fn test_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FreezeFrameSink::new("freeze", dir.path()).unwrap();
        sink.write(&sample_artifacts()).await.unwrap();

        let content = fs::read_to_string(dir.path().join(FREEZE_FRAME_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["frame"], 140);
        assert_eq!(records[0]["wyscout_event_id"], "1-1");
        assert_eq!(records[0]["projected_wyscout_event_y"], "unknown");
    }
}
