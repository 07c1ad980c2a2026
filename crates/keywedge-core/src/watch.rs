use crate::config::AppConfig;
use crate::error::ConfigError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Watches a config file and yields every successfully re-parsed [`AppConfig`].
///
/// The parent directory is watched rather than the file itself so that editors
/// which save by rename are still picked up. Parse failures are logged and the
/// previous config stays in effect.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn spawn(path: &Path) -> Result<(Self, mpsc::UnboundedReceiver<AppConfig>), ConfigError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let path = path.to_path_buf();
        let watch_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let target = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("config watch error: {e}");
                    return;
                }
            };
            if !is_relevant(&event, &target) {
                return;
            }
            match AppConfig::load_from_file(&target) {
                Ok(config) => {
                    let _ = tx.send(config);
                }
                Err(e) => {
                    tracing::warn!(path = %target.display(), "ignoring config reload: {e}");
                }
            }
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        tracing::debug!(path = %path.display(), "watching config file");
        Ok((
            Self {
                _watcher: watcher,
                path,
            },
            rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_relevant(event: &Event, target: &Path) -> bool {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }
    let Some(name) = target.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}
