use std::time::Duration;
use tokio::time::Instant;

/// A single keystroke as delivered by the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub ch: char,
    pub at: Instant,
}

impl InputEvent {
    pub fn new(ch: char, at: Instant) -> Self {
        Self { ch, at }
    }
}

/// Characters accumulated since the first keystroke of the current burst.
///
/// `started_at` is set exactly when the buffer goes from empty to non-empty
/// and cleared exactly when the buffer is cleared.
#[derive(Debug, Default)]
pub struct InputBuffer {
    text: String,
    started_at: Option<Instant>,
    last_at: Option<Instant>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        if self.text.is_empty() {
            self.started_at = Some(event.at);
        }
        self.text.push(event.ch);
        self.last_at = Some(event.at);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn last_at(&self) -> Option<Instant> {
        self.last_at
    }

    /// Time between the first and the last keystroke of the burst.
    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.last_at) {
            (Some(start), Some(last)) => last.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.started_at = None;
        self.last_at = None;
    }

    /// Take the buffered text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.clear();
        text
    }
}
