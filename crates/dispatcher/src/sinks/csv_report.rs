//! CsvReportSink - writes the two CSV reports

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ArtifactSink, ContractError, EventReportRow, EventTypeReportRow, SyncArtifacts};
use tracing::{debug, instrument};

pub const REPORT_BY_EVENT_FILE: &str = "report_by_event.csv";
pub const REPORT_BY_EVENT_TYPE_FILE: &str = "report_by_event_type.csv";

/// Sink writing `report_by_event.csv` and `report_by_event_type.csv`
pub struct CsvReportSink {
    name: String,
    output_dir: PathBuf,
}

impl CsvReportSink {
    /// Create the sink, creating the output directory if needed
    pub fn new(name: impl Into<String>, output_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            name: name.into(),
            output_dir,
        })
    }

    fn write_table<I>(&self, file: &str, headers: Vec<String>, records: I) -> Result<(), ContractError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let path = self.output_dir.join(file);
        let sink_err = |e: csv::Error| ContractError::sink_write(&self.name, format!("{}: {e}", path.display()));

        let mut writer = csv::Writer::from_path(&path).map_err(sink_err)?;
        writer.write_record(&headers).map_err(sink_err)?;
        let mut rows = 0usize;
        for record in records {
            writer.write_record(&record).map_err(sink_err)?;
            rows += 1;
        }
        writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, format!("{}: {e}", path.display())))?;
        debug!(sink = %self.name, file, rows, "report written");
        Ok(())
    }
}

impl ArtifactSink for CsvReportSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_report_sink_write",
        skip(self, artifacts),
        fields(sink = %self.name, provider = %artifacts.provider)
    )]
    async fn write(&mut self, artifacts: &SyncArtifacts) -> Result<(), ContractError> {
        self.write_table(
            REPORT_BY_EVENT_FILE,
            EventReportRow::headers(artifacts.provider),
            artifacts.by_event.iter().map(EventReportRow::record),
        )?;
        self.write_table(
            REPORT_BY_EVENT_TYPE_FILE,
            EventTypeReportRow::headers(artifacts.provider),
            artifacts.by_event_type.iter().map(EventTypeReportRow::record),
        )
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
