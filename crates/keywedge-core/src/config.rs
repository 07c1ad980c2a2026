use crate::error::ConfigError;
use crate::types::ContextTag;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub classifier: ClassifierTuning,

    #[serde(default)]
    pub context: Vec<ContextConfig>,

    #[serde(default)]
    pub sinks: Option<toml::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_initial_context")]
    pub initial_context: String,

    #[serde(default)]
    pub trace_analyses: bool,

    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            initial_context: default_initial_context(),
            trace_analyses: false,
            log_capacity: default_log_capacity(),
        }
    }
}

/// Thresholds driving burst classification.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierTuning {
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,

    #[serde(default = "default_fast_threshold_ms")]
    pub fast_threshold_ms: u64,

    #[serde(default = "default_min_barcode_len")]
    pub min_barcode_len: usize,

    #[serde(default = "default_max_barcode_len")]
    pub max_barcode_len: usize,

    #[serde(default = "default_min_fast_len")]
    pub min_fast_len: usize,
}

impl Default for ClassifierTuning {
    fn default() -> Self {
        Self {
            completion_timeout_ms: default_completion_timeout_ms(),
            fast_threshold_ms: default_fast_threshold_ms(),
            min_barcode_len: default_min_barcode_len(),
            max_barcode_len: default_max_barcode_len(),
            min_fast_len: default_min_fast_len(),
        }
    }
}

impl ClassifierTuning {
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion_timeout_ms == 0 {
            return Err(ConfigError::InvalidTuning(
                "completion_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.fast_threshold_ms == 0 {
            return Err(ConfigError::InvalidTuning(
                "fast_threshold_ms must be greater than zero".to_string(),
            ));
        }
        if self.min_barcode_len > self.max_barcode_len {
            return Err(ConfigError::InvalidTuning(format!(
                "min_barcode_len ({}) exceeds max_barcode_len ({})",
                self.min_barcode_len, self.max_barcode_len
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    pub id: String,

    #[serde(default)]
    pub sinks: Vec<SinkRouteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkRouteConfig {
    pub plugin: String,

    #[serde(default)]
    pub prefix: String,

    #[serde(flatten)]
    pub extra: toml::Value,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_initial_context() -> String {
    ContextTag::NONE.to_string()
}

fn default_log_capacity() -> usize {
    1000
}

fn default_completion_timeout_ms() -> u64 {
    150
}

fn default_fast_threshold_ms() -> u64 {
    80
}

fn default_min_barcode_len() -> usize {
    8
}

fn default_max_barcode_len() -> usize {
    20
}

fn default_min_fast_len() -> usize {
    6
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern compiles");
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => result = result.replace(&cap[0], &val),
            Err(_) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        }
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.classifier.validate()?;
        Ok(config)
    }

    pub fn initial_context(&self) -> ContextTag {
        ContextTag::new(self.general.initial_context.clone())
    }

    /// Every selectable context: `none` first, then configured ones in file order.
    pub fn context_tags(&self) -> Vec<ContextTag> {
        let mut tags = vec![ContextTag::none()];
        for ctx in &self.context {
            let tag = ContextTag::new(ctx.id.clone());
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Global `[sinks.<plugin>]` defaults overlaid with the per-route extras.
    pub fn merged_sink_config(&self, route: &SinkRouteConfig) -> toml::Value {
        let mut merged = self
            .sinks
            .as_ref()
            .and_then(|s| s.get(&route.plugin))
            .cloned()
            .unwrap_or_else(|| toml::Value::Table(Default::default()));

        if let (Some(base), Some(extra)) = (merged.as_table_mut(), route.extra.as_table()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse_valid_toml() {
        let toml_str = r#"
[general]
log_level = "debug"
initial_context = "sku-field"
trace_analyses = true

[classifier]
completion_timeout_ms = 200
fast_threshold_ms = 60

[[context]]
id = "sku-field"

[[context.sinks]]
plugin = "file"
prefix = "[SKU] "
path = "/tmp/sku.txt"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.initial_context, "sku-field");
        assert!(config.general.trace_analyses);
        assert_eq!(config.classifier.completion_timeout_ms, 200);
        assert_eq!(config.classifier.fast_threshold_ms, 60);
        assert_eq!(config.classifier.min_barcode_len, 8);
        assert_eq!(config.context.len(), 1);
        assert_eq!(config.context[0].id, "sku-field");
        assert_eq!(config.context[0].sinks[0].plugin, "file");
        assert_eq!(config.context[0].sinks[0].prefix, "[SKU] ");
    }

    #[test]
    fn test_config_default_values() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.initial_context, "none");
        assert!(!config.general.trace_analyses);
        assert_eq!(config.general.log_capacity, 1000);
        assert_eq!(config.classifier, ClassifierTuning::default());
        assert_eq!(config.classifier.completion_timeout_ms, 150);
        assert_eq!(config.classifier.fast_threshold_ms, 80);
        assert_eq!(config.classifier.max_barcode_len, 20);
        assert_eq!(config.classifier.min_fast_len, 6);
        assert!(config.context.is_empty());
        assert!(config.sinks.is_none());
    }

    #[test]
    fn test_config_env_var_interpolation() {
        std::env::set_var("KEYWEDGE_TEST_LEVEL", "trace");
        let toml_str = r#"
[general]
log_level = "${KEYWEDGE_TEST_LEVEL}"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "trace");
        std::env::remove_var("KEYWEDGE_TEST_LEVEL");
    }

    #[test]
    fn test_config_missing_env_var_error() {
        let toml_str = r#"
[general]
log_level = "${DEFINITELY_DOES_NOT_EXIST_12345}"
"#;
        let err = AppConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let result = AppConfig::from_toml_str("this is not valid toml [[[");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let toml_str = r#"
[classifier]
completion_timeout_ms = 0
"#;
        let result = AppConfig::from_toml_str(toml_str);
        assert!(matches!(result, Err(ConfigError::InvalidTuning(_))));
    }

    #[test]
    fn test_config_rejects_inverted_barcode_window() {
        let toml_str = r#"
[classifier]
min_barcode_len = 21
max_barcode_len = 20
"#;
        let err = AppConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("min_barcode_len"));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = std::env::temp_dir().join("keywedge_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[classifier]
fast_threshold_ms = 50

[[context]]
id = "upc-field"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.classifier.fast_threshold_ms, 50);
        assert_eq!(config.context[0].id, "upc-field");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_load_from_file_not_found() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read config file"));
    }

    #[test]
    fn test_config_context_tags_start_with_none() {
        let toml_str = r#"
[[context]]
id = "sku-field"

[[context]]
id = "upc-field"

[[context]]
id = "sku-field"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        let tags: Vec<_> = config.context_tags().iter().map(|t| t.to_string()).collect();
        assert_eq!(tags, vec!["none", "sku-field", "upc-field"]);
    }

    #[test]
    fn test_config_merged_sink_config_overlays_route_extras() {
        let toml_str = r#"
[sinks.file]
path = "/tmp/all.txt"
mode = "append"

[[context]]
id = "sku-field"

[[context.sinks]]
plugin = "file"
path = "/tmp/sku.txt"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        let merged = config.merged_sink_config(&config.context[0].sinks[0]);
        assert_eq!(merged.get("path").and_then(|v| v.as_str()), Some("/tmp/sku.txt"));
        assert_eq!(merged.get("mode").and_then(|v| v.as_str()), Some("append"));
    }

    #[test]
    fn test_config_tuning_completion_timeout_duration() {
        let tuning = ClassifierTuning::default();
        assert_eq!(tuning.completion_timeout(), Duration::from_millis(150));
    }
}
