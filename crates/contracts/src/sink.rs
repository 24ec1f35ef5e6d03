//! ArtifactSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks receiving the finished artifacts.

use crate::{ContractError, SyncArtifacts};

/// Artifact output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ArtifactSink: Send)]
pub trait LocalArtifactSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write the artifacts of one match
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, artifacts: &SyncArtifacts) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
