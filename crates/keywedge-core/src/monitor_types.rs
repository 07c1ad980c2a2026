use crate::config::ClassifierTuning;
use crate::types::{BurstAnalysis, ContextTag, ScanResult};

/// Aggregate service state broadcast to the monitor via watch channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    pub context: ContextTag,
    pub contexts: Vec<ContextTag>,
    pub tuning: ClassifierTuning,
    pub modal_open: bool,
    pub focused: bool,
    pub recent_scans: Vec<ScanResult>,
    pub recent_analyses: Vec<BurstAnalysis>,
    pub warnings: Vec<String>,
    pub is_running: bool,
}

impl MonitorState {
    /// The context that follows the current one, wrapping around.
    pub fn next_context(&self) -> ContextTag {
        if self.contexts.is_empty() {
            return self.context.clone();
        }
        let idx = self
            .contexts
            .iter()
            .position(|c| *c == self.context)
            .map(|i| (i + 1) % self.contexts.len())
            .unwrap_or(0);
        self.contexts[idx].clone()
    }
}

/// Commands sent from the monitor → main via mpsc channel.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    SetContext(ContextTag),
    SetModal(bool),
    SetFocused(bool),
    Quit,
}
