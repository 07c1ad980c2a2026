use crate::sink_trait::ScanSink;
use keywedge_core::SinkError;
use std::collections::HashMap;

pub struct SinkRegistry {
    factories: HashMap<String, fn() -> Box<dyn ScanSink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("file", || Box::new(crate::file_sink::FileSink::new()));
        registry.register("log", || Box::new(crate::log_sink::LogSink::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn ScanSink>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn ScanSink>, SinkError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| SinkError::NotFound(name.to_string()))
    }

    pub fn list_sinks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
