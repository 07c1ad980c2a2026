pub mod file_sink;
pub mod log_sink;
pub mod registry;
pub mod router;
pub mod sink_trait;

pub use file_sink::FileSink;
pub use log_sink::LogSink;
pub use registry::SinkRegistry;
pub use router::ScanRouter;
pub use sink_trait::ScanSink;
