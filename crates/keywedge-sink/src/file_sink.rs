use crate::sink_trait::ScanSink;
use async_trait::async_trait;
use keywedge_core::{RouteMetadata, ScanResult, SinkError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Appends `"{prefix}{text}"` lines to a file.
pub struct FileSink {
    output_path: Mutex<Option<PathBuf>>,
    delivered: AtomicUsize,
}

impl FileSink {
    pub fn new() -> Self {
        Self {
            output_path: Mutex::new(None),
            delivered: AtomicUsize::new(0),
        }
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }

    fn path(&self) -> Option<PathBuf> {
        self.output_path.lock().ok().and_then(|p| p.clone())
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), SinkError> {
        let path = config
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SinkError::InitializationFailed("missing 'path' in config".to_string()))?;
        let mut guard = self
            .output_path
            .lock()
            .map_err(|e| SinkError::InitializationFailed(e.to_string()))?;
        *guard = Some(PathBuf::from(path));
        Ok(())
    }

    async fn deliver(&self, scan: &ScanResult, metadata: &RouteMetadata) -> Result<(), SinkError> {
        let path = self
            .path()
            .ok_or_else(|| SinkError::DeliveryFailed("not initialized".to_string()))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SinkError::DeliveryFailed(e.to_string()))?;

        writeln!(file, "{}{}", metadata.prefix, scan.text)
            .map_err(|e| SinkError::DeliveryFailed(e.to_string()))?;

        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.path().is_some()
    }

    async fn shutdown(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywedge_core::{Confidence, ContextTag};
    use std::time::Duration;

    fn path_config(path: &std::path::Path) -> toml::Value {
        toml::Value::Table({
            let mut t = toml::map::Map::new();
            t.insert(
                "path".to_string(),
                toml::Value::String(path.to_string_lossy().to_string()),
            );
            t
        })
    }

    fn scan(text: &str) -> ScanResult {
        ScanResult {
            text: text.to_string(),
            context: ContextTag::new("sku"),
            confidence: Confidence::High,
            char_count: text.chars().count(),
            elapsed: Duration::from_millis(70),
        }
    }

    fn meta(prefix: &str) -> RouteMetadata {
        RouteMetadata {
            context: ContextTag::new("sku"),
            prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_file_sink_name() {
        assert_eq!(FileSink::new().name(), "file");
    }

    #[tokio::test]
    async fn test_file_sink_initialize_missing_path_fails() {
        let mut sink = FileSink::new();
        match sink.initialize(toml::Value::Table(Default::default())).await {
            Err(SinkError::InitializationFailed(msg)) => assert!(msg.contains("path")),
            other => panic!("expected InitializationFailed, got {other:?}"),
        }
        assert!(!sink.is_healthy());
    }

    #[tokio::test]
    async fn test_file_sink_deliver_appends_with_prefix() {
        let dir = std::env::temp_dir().join("keywedge_file_sink_append");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scans.txt");
        let _ = std::fs::remove_file(&path);

        let mut sink = FileSink::new();
        sink.initialize(path_config(&path)).await.unwrap();
        assert!(sink.is_healthy());

        sink.deliver(&scan("12345678"), &meta("[SKU] ")).await.unwrap();
        sink.deliver(&scan("87654321"), &meta("")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[SKU] 12345678\n87654321\n");
        assert_eq!(sink.delivered(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_file_sink_deliver_before_initialize_fails() {
        let sink = FileSink::new();
        let result = sink.deliver(&scan("12345678"), &meta("")).await;
        assert!(matches!(result, Err(SinkError::DeliveryFailed(_))));
    }

    #[test]
    fn test_file_sink_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileSink>();
    }
}
