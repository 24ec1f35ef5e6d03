//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use contracts::{ArtifactSink, SyncArtifacts};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send artifacts to worker
    tx: mpsc::Sender<Arc<SyncArtifacts>>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: ArtifactSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue artifacts for the sink, waiting for room when the queue is full.
    pub async fn send(&self, artifacts: Arc<SyncArtifacts>) -> Result<(), DispatcherError> {
        self.tx
            .send(artifacts)
            .await
            .map_err(|_| DispatcherError::WorkerClosed {
                sink_name: self.name.clone(),
            })?;
        self.metrics
            .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
        Ok(())
    }

    /// Shutdown the sink worker gracefully
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> MetricsSnapshot {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
            self.metrics.inc_failure_count();
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
        self.metrics.snapshot()
    }
}

/// Worker task that consumes artifacts and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: ArtifactSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Arc<SyncArtifacts>>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(artifacts) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let started = Instant::now();
        match sink.write(&artifacts).await {
            Ok(()) => {
                metrics.record_write(&artifacts, started.elapsed());
                metrics::counter!("event_sync_sink_writes_total", "sink" => name.clone())
                    .increment(1);
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    sink = %name,
                    provider = %artifacts.provider,
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        metrics.inc_failure_count();
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        metrics.inc_failure_count();
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::sample_artifacts;
    use contracts::ContractError;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl ArtifactSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _artifacts: &SyncArtifacts) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn mock(name: &str, should_fail: bool, delay_ms: u64) -> (MockSink, Arc<AtomicU64>) {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            name: name.to_string(),
            write_count: Arc::clone(&write_count),
            should_fail,
            delay_ms,
        };
        (sink, write_count)
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let (sink, write_count) = mock("test", false, 0);
        let handle = SinkHandle::spawn(sink, 10);

        let artifacts = Arc::new(sample_artifacts());
        for _ in 0..5 {
            handle.send(Arc::clone(&artifacts)).await.unwrap();
        }

        let snapshot = handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert_eq!(snapshot.write_count, 5);
        assert_eq!(snapshot.failure_count, 0);
    }

    #[tokio::test]
    async fn test_slow_sink_applies_backpressure() {
        let (sink, write_count) = mock("slow", false, 20);
        let handle = SinkHandle::spawn(sink, 1);

        let artifacts = Arc::new(sample_artifacts());
        for _ in 0..4 {
            handle.send(Arc::clone(&artifacts)).await.unwrap();
        }

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let (sink, _) = mock("failing", true, 0);
        let handle = SinkHandle::spawn(sink, 10);

        let artifacts = Arc::new(sample_artifacts());
        for _ in 0..3 {
            handle.send(Arc::clone(&artifacts)).await.unwrap();
        }

        let snapshot = handle.shutdown().await;
        assert_eq!(snapshot.failure_count, 3);
        assert_eq!(snapshot.write_count, 0);
    }
}
