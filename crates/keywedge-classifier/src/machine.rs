use crate::analysis::analyze;
use crate::buffer::{InputBuffer, InputEvent};
use crate::observer::AnalysisObserver;
use keywedge_core::{ClassifierTuning, ContextTag, Decision, ScanResult, Trigger};
use tokio::time::Instant;

/// Runtime-agnostic burst classifier.
///
/// Owns one input buffer, the routing context, and the completion deadline.
/// The caller drives time: it arms nothing itself, it only reports the
/// deadline and expects [`on_timeout`](Self::on_timeout) once that passes.
/// [`Classifier`](crate::Classifier) wraps this with a tokio timer; replay
/// drives it with recorded timestamps.
pub struct BurstClassifier {
    buffer: InputBuffer,
    context: ContextTag,
    tuning: ClassifierTuning,
    deadline: Option<Instant>,
    observers: Vec<Box<dyn AnalysisObserver>>,
}

impl BurstClassifier {
    pub fn new(tuning: ClassifierTuning) -> Self {
        Self {
            buffer: InputBuffer::new(),
            context: ContextTag::none(),
            tuning,
            deadline: None,
            observers: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: ContextTag) -> Self {
        self.context = context;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn AnalysisObserver>) {
        self.observers.push(observer);
    }

    pub fn context(&self) -> &ContextTag {
        &self.context
    }

    pub fn tuning(&self) -> &ClassifierTuning {
        &self.tuning
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn buffered(&self) -> &str {
        self.buffer.as_str()
    }

    /// Append a keystroke and re-arm the completion deadline.
    ///
    /// If the keystroke arrives at or after the pending deadline, the previous
    /// burst is completed first and its result (if any) is returned.
    pub fn on_character(&mut self, event: InputEvent) -> Option<ScanResult> {
        let completed = match self.deadline {
            Some(deadline) if event.at >= deadline => self.complete(Trigger::Timeout),
            _ => None,
        };

        self.buffer.push(event);
        self.deadline = Some(event.at + self.tuning.completion_timeout());
        completed
    }

    /// Explicit end of burst: analyze now without waiting for the deadline.
    pub fn on_terminator(&mut self) -> Option<ScanResult> {
        self.deadline = None;
        if self.buffer.is_empty() {
            return None;
        }
        self.complete(Trigger::Terminator)
    }

    /// Complete the burst if the deadline has passed by `now`.
    pub fn on_timeout(&mut self, now: Instant) -> Option<ScanResult> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.complete(Trigger::Timeout),
            _ => None,
        }
    }

    pub fn on_focus_changed(&mut self, focused: bool) {
        if focused {
            self.interrupt("focus gained");
        }
    }

    pub fn on_modal_presented(&mut self, presented: bool) {
        if presented {
            self.interrupt("modal presented");
        }
    }

    pub fn set_context(&mut self, context: ContextTag) {
        if self.context != context {
            tracing::debug!(from = %self.context, to = %context, "scan context changed");
            self.context = context;
        }
    }

    /// Swap thresholds. A pending deadline is recomputed from the last keystroke.
    pub fn retune(&mut self, tuning: ClassifierTuning) {
        self.tuning = tuning;
        if self.deadline.is_some() {
            self.deadline = self
                .buffer
                .last_at()
                .map(|last| last + self.tuning.completion_timeout());
        }
    }

    fn interrupt(&mut self, reason: &str) {
        if !self.buffer.is_empty() {
            tracing::debug!(discarded = self.buffer.len(), "{reason}, dropping partial burst");
        }
        self.buffer.clear();
        self.deadline = None;
    }

    fn complete(&mut self, trigger: Trigger) -> Option<ScanResult> {
        self.deadline = None;
        let elapsed = self.buffer.elapsed();
        let raw = self.buffer.take();
        let analysis = analyze(&raw, elapsed, &self.tuning, trigger);

        for observer in &self.observers {
            observer.on_analysis(&analysis);
        }

        match analysis.decision {
            Decision::Scanned(confidence) => Some(ScanResult {
                text: analysis.text,
                context: self.context.clone(),
                confidence,
                char_count: analysis.char_count,
                elapsed,
            }),
            Decision::Typed | Decision::Empty => None,
        }
    }
}
