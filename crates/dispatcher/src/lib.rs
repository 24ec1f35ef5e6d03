//! # Dispatcher
//!
//! Artifact distribution module.
//!
//! Responsibilities:
//! - Consume finished `SyncArtifacts`
//! - Fan-out to the report, freeze-frame and log sinks
//! - Isolate sinks from each other: one failing sink never stops the others

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{ArtifactSink, SyncArtifacts};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{
    CsvReportSink, FreezeFrameSink, LogSink, FREEZE_FRAME_FILE, REPORT_BY_EVENT_FILE,
    REPORT_BY_EVENT_TYPE_FILE,
};
