//! Per-sink counters, readable while the worker runs

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use contracts::SyncArtifacts;

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Artifact bundles waiting in the queue
    queue_len: AtomicUsize,
    /// Bundles written successfully
    write_count: AtomicU64,
    /// Report rows and freeze frames covered by successful writes
    rows_written: AtomicU64,
    /// Failed writes, flushes and closes
    failure_count: AtomicU64,
    /// Duration of the latest successful write, microseconds
    last_write_us: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    /// Record one successful write of `artifacts` that took `elapsed`.
    pub fn record_write(&self, artifacts: &SyncArtifacts, elapsed: Duration) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.rows_written
            .fetch_add(artifact_rows(artifacts), Ordering::Relaxed);
        self.last_write_us.store(
            u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_write(&self) -> Duration {
        Duration::from_micros(self.last_write_us.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            rows_written: self.rows_written(),
            failure_count: self.failure_count(),
            last_write: self.last_write(),
        }
    }
}

/// Rows one bundle contributes across both reports and the freeze frames.
pub fn artifact_rows(artifacts: &SyncArtifacts) -> u64 {
    (artifacts.by_event.len() + artifacts.by_event_type.len() + artifacts.freeze_frames.len())
        as u64
}

/// Point-in-time copy of a sink's metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub rows_written: u64,
    pub failure_count: u64,
    pub last_write: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::sample_artifacts;

    #[test]
    fn test_snapshot_counts() {
        let artifacts = sample_artifacts();
        let metrics = SinkMetrics::new();
        metrics.record_write(&artifacts, Duration::from_micros(250));
        metrics.record_write(&artifacts, Duration::from_micros(400));
        metrics.inc_failure_count();
        metrics.set_queue_len(3);

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                queue_len: 3,
                write_count: 2,
                rows_written: 2 * artifact_rows(&artifacts),
                failure_count: 1,
                last_write: Duration::from_micros(400),
            }
        );
    }
}
