use crate::sink_trait::ScanSink;
use async_trait::async_trait;
use keywedge_core::{RouteMetadata, ScanResult, SinkError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reports each scan as an info-level tracing event. Takes no configuration.
pub struct LogSink {
    delivered: AtomicUsize,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            delivered: AtomicUsize::new(0),
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), SinkError> {
        Ok(())
    }

    async fn deliver(&self, scan: &ScanResult, metadata: &RouteMetadata) -> Result<(), SinkError> {
        tracing::info!(
            context = %metadata.context,
            confidence = %scan.confidence,
            "{}{}",
            metadata.prefix,
            scan.text,
        );
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }

    async fn shutdown(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
