use crate::buffer::InputEvent;
use crate::machine::BurstClassifier;
use crate::observer::AnalysisObserver;
use keywedge_core::{ClassifierTuning, ContextTag, ScanResult};
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierCommand {
    Character(InputEvent),
    Terminator,
    FocusChanged(bool),
    ModalPresented(bool),
    SetContext(ContextTag),
    Retune(ClassifierTuning),
    Shutdown,
}

/// Cheap, cloneable entry point for event producers.
///
/// Every call is a non-blocking channel send, so it is safe from any thread,
/// including a terminal reader thread or a timer callback.
#[derive(Clone)]
pub struct ClassifierHandle {
    tx: mpsc::UnboundedSender<ClassifierCommand>,
}

impl ClassifierHandle {
    pub fn on_character(&self, ch: char, at: Instant) {
        self.send(ClassifierCommand::Character(InputEvent::new(ch, at)));
    }

    pub fn on_character_now(&self, ch: char) {
        self.on_character(ch, Instant::now());
    }

    pub fn on_terminator(&self) {
        self.send(ClassifierCommand::Terminator);
    }

    pub fn on_focus_changed(&self, focused: bool) {
        self.send(ClassifierCommand::FocusChanged(focused));
    }

    pub fn on_modal_presented(&self, presented: bool) {
        self.send(ClassifierCommand::ModalPresented(presented));
    }

    pub fn set_context(&self, context: ContextTag) {
        self.send(ClassifierCommand::SetContext(context));
    }

    pub fn retune(&self, tuning: ClassifierTuning) {
        self.send(ClassifierCommand::Retune(tuning));
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, cmd: ClassifierCommand) {
        if self.tx.send(cmd).is_err() {
            tracing::debug!("classifier stopped, dropping input");
        }
    }
}

/// Owns one [`BurstClassifier`] on a dedicated task.
///
/// All mutations are funneled through a single command channel, and the
/// completion timer is a single `sleep_until` re-armed whenever the deadline
/// moves. Scans come out of the receiver returned by
/// [`take_result_receiver`](Self::take_result_receiver).
pub struct Classifier {
    machine: Option<BurstClassifier>,
    cmd_tx: mpsc::UnboundedSender<ClassifierCommand>,
    cmd_rx: Option<mpsc::UnboundedReceiver<ClassifierCommand>>,
    result_tx: mpsc::UnboundedSender<ScanResult>,
    result_rx: Option<mpsc::UnboundedReceiver<ScanResult>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Classifier {
    pub fn new(tuning: ClassifierTuning) -> Self {
        Self::from_machine(BurstClassifier::new(tuning))
    }

    pub fn from_machine(machine: BurstClassifier) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        Self {
            machine: Some(machine),
            cmd_tx,
            cmd_rx: Some(cmd_rx),
            result_tx,
            result_rx: Some(result_rx),
            task_handle: None,
        }
    }

    /// Install an observer. Has no effect once [`start`](Self::start) has run.
    pub fn add_observer(&mut self, observer: Box<dyn AnalysisObserver>) {
        match self.machine.as_mut() {
            Some(machine) => machine.add_observer(observer),
            None => tracing::warn!("observer added after classifier start, ignoring"),
        }
    }

    pub fn handle(&self) -> ClassifierHandle {
        ClassifierHandle {
            tx: self.cmd_tx.clone(),
        }
    }

    pub fn take_result_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<ScanResult>> {
        self.result_rx.take()
    }

    pub fn start(&mut self) {
        let (Some(mut machine), Some(mut cmd_rx)) = (self.machine.take(), self.cmd_rx.take())
        else {
            tracing::warn!("classifier already started");
            return;
        };
        let result_tx = self.result_tx.clone();

        let handle = tokio::spawn(async move {
            loop {
                let deadline = machine.deadline();
                let emitted = tokio::select! {
                    biased;
                    _ = wait_until(deadline) => machine.on_timeout(Instant::now()),
                    cmd = cmd_rx.recv() => match cmd {
                        Some(ClassifierCommand::Shutdown) | None => break,
                        Some(cmd) => apply(&mut machine, cmd),
                    },
                };

                if let Some(result) = emitted {
                    tracing::info!(
                        context = %result.context,
                        confidence = %result.confidence,
                        len = result.char_count,
                        "scan classified"
                    );
                    if result_tx.send(result).is_err() {
                        tracing::debug!("scan receiver dropped");
                    }
                }
            }
            tracing::debug!(
                pending = machine.buffered().len(),
                "classifier stopped"
            );
        });

        self.task_handle = Some(handle);
    }

    /// Stop the task. An in-flight burst is dropped without emission.
    pub async fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(ClassifierCommand::Shutdown);
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}

fn apply(machine: &mut BurstClassifier, cmd: ClassifierCommand) -> Option<ScanResult> {
    match cmd {
        ClassifierCommand::Character(event) => machine.on_character(event),
        ClassifierCommand::Terminator => machine.on_terminator(),
        ClassifierCommand::FocusChanged(focused) => {
            machine.on_focus_changed(focused);
            None
        }
        ClassifierCommand::ModalPresented(presented) => {
            machine.on_modal_presented(presented);
            None
        }
        ClassifierCommand::SetContext(context) => {
            machine.set_context(context);
            None
        }
        ClassifierCommand::Retune(tuning) => {
            tracing::info!(
                completion_timeout_ms = tuning.completion_timeout_ms,
                fast_threshold_ms = tuning.fast_threshold_ms,
                "classifier retuned"
            );
            machine.retune(tuning);
            None
        }
        ClassifierCommand::Shutdown => None,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn type_chars(handle: &ClassifierHandle, text: &str, gap: Duration) {
        for (i, ch) in text.chars().enumerate() {
            if i > 0 {
                tokio::time::advance(gap).await;
            }
            handle.on_character_now(ch);
        }
    }

    #[tokio::test]
    async fn test_classifier_take_result_receiver_once() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        assert!(classifier.take_result_receiver().is_some());
        assert!(classifier.take_result_receiver().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_timeout_emits_scan() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        let mut rx = classifier.take_result_receiver().unwrap();
        let handle = classifier.handle();
        classifier.start();

        type_chars(&handle, "12345678", Duration::from_millis(10)).await;

        let result = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(result.text, "12345678");
        assert!(result.context.is_none());

        classifier.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_waits_for_completion_timeout() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        let mut rx = classifier.take_result_receiver().unwrap();
        let handle = classifier.handle();
        classifier.start();

        type_chars(&handle, "12345678", Duration::from_millis(10)).await;
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(60)).await;
        let result = tokio::time::timeout(Duration::from_millis(10), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(result.text, "12345678");

        classifier.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_set_context_tags_results() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        let mut rx = classifier.take_result_receiver().unwrap();
        let handle = classifier.handle();
        classifier.start();

        handle.set_context(ContextTag::new("upc-field"));
        type_chars(&handle, "0123456789012", Duration::from_millis(5)).await;
        handle.on_terminator();

        let result = rx.recv().await.expect("channel closed");
        assert_eq!(result.context.as_str(), "upc-field");

        classifier.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_retune_applies_to_next_burst() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        let mut rx = classifier.take_result_receiver().unwrap();
        let handle = classifier.handle();
        classifier.start();

        handle.retune(ClassifierTuning {
            fast_threshold_ms: 5,
            ..ClassifierTuning::default()
        });
        type_chars(&handle, "12345678", Duration::from_millis(10)).await;
        handle.on_terminator();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());

        classifier.shutdown().await;
    }

    #[tokio::test]
    async fn test_classifier_shutdown_completes_with_live_handles() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        let handle = classifier.handle();
        classifier.start();

        tokio::time::timeout(Duration::from_secs(2), classifier.shutdown())
            .await
            .expect("shutdown timed out");
        assert!(handle.is_closed());
        // Calls after shutdown are ignored
        handle.on_character_now('1');
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_shutdown_drops_in_flight_burst() {
        let mut classifier = Classifier::new(ClassifierTuning::default());
        let mut rx = classifier.take_result_receiver().unwrap();
        let handle = classifier.handle();
        classifier.start();

        type_chars(&handle, "12345678", Duration::from_millis(10)).await;
        classifier.shutdown().await;
        drop(classifier);

        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_classifier_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClassifierHandle>();
    }
}
