pub mod config;
pub mod config_diff;
pub mod error;
pub mod monitor_types;
pub mod types;
pub mod watch;

pub use config::{AppConfig, ClassifierTuning, ContextConfig, SinkRouteConfig};
pub use config_diff::ConfigDiff;
pub use error::{ConfigError, ReplayError, SinkError};
pub use monitor_types::{MonitorState, UiCommand};
pub use types::{BurstAnalysis, Confidence, ContextTag, Decision, RouteMetadata, ScanResult, Trigger};
pub use watch::ConfigWatcher;
