use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid classifier tuning: {0}")]
    InvalidTuning(String),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink initialization failed: {0}")]
    InitializationFailed(String),

    #[error("failed to deliver scan: {0}")]
    DeliveryFailed(String),

    #[error("sink not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("line {line}: offset goes backwards")]
    NonMonotonic { line: usize },
}
