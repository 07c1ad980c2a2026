use async_trait::async_trait;
use keywedge_core::{RouteMetadata, ScanResult, SinkError};

/// Receives scans classified while its context was active.
///
/// Implementations are registered via [`SinkRegistry`](crate::SinkRegistry)
/// and wired to a context tag by [`ScanRouter`](crate::ScanRouter).
#[async_trait]
pub trait ScanSink: Send + Sync {
    /// Returns the sink's plugin name (e.g. `"file"`, `"log"`).
    fn name(&self) -> &str;
    /// One-time initialisation with sink-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), SinkError>;
    /// Deliver one scan.
    async fn deliver(&self, scan: &ScanResult, metadata: &RouteMetadata) -> Result<(), SinkError>;
    /// Returns `true` if the sink can currently accept scans.
    fn is_healthy(&self) -> bool;
    /// Release resources.
    async fn shutdown(&self) -> Result<(), SinkError>;
}
