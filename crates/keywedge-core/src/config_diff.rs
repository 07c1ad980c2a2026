use crate::config::{AppConfig, ClassifierTuning, ContextConfig};

/// Describes runtime-safe changes between two configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDiff {
    pub tuning_change: Option<ClassifierTuning>,
    pub trace_analyses_change: Option<bool>,
    pub non_reloadable: Vec<String>,
}

impl ConfigDiff {
    /// Compare two configs and return the diff.
    /// Reloadable: classifier tuning, trace_analyses.
    /// Non-reloadable: log level, contexts and their sink routes; logged as warnings.
    pub fn diff(old: &AppConfig, new: &AppConfig) -> Self {
        let mut result = Self::default();

        if old.classifier != new.classifier {
            result.tuning_change = Some(new.classifier);
        }

        if old.general.trace_analyses != new.general.trace_analyses {
            result.trace_analyses_change = Some(new.general.trace_analyses);
        }

        if old.general.log_level != new.general.log_level {
            result.non_reloadable.push(format!(
                "log_level changed ('{}' → '{}'), requires restart",
                old.general.log_level, new.general.log_level
            ));
        }

        let old_ids: Vec<&str> = old.context.iter().map(|c| c.id.as_str()).collect();
        let new_ids: Vec<&str> = new.context.iter().map(|c| c.id.as_str()).collect();
        if old_ids != new_ids {
            result.non_reloadable.push(format!(
                "context list changed ({:?} → {:?}), requires restart",
                old_ids, new_ids
            ));
        }

        for new_ctx in &new.context {
            if let Some(old_ctx) = old.context.iter().find(|c| c.id == new_ctx.id) {
                if route_keys(old, old_ctx) != route_keys(new, new_ctx) {
                    result.non_reloadable.push(format!(
                        "sink routes for context '{}' changed, requires restart",
                        new_ctx.id
                    ));
                }
            }
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.tuning_change.is_none()
            && self.trace_analyses_change.is_none()
            && self.non_reloadable.is_empty()
    }
}

/// Everything a running sink was initialized from, in route order.
fn route_keys<'a>(
    config: &AppConfig,
    context: &'a ContextConfig,
) -> Vec<(&'a str, &'a str, toml::Value)> {
    context
        .sinks
        .iter()
        .map(|route| {
            (
                route.plugin.as_str(),
                route.prefix.as_str(),
                config.merged_sink_config(route),
            )
        })
        .collect()
}
