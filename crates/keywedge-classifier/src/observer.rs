use keywedge_core::BurstAnalysis;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Hook invoked once per completed analysis, scanned or not.
///
/// Interrupted bursts (focus gained, modal shown) are dropped before analysis
/// and never reach observers.
pub trait AnalysisObserver: Send {
    fn on_analysis(&self, analysis: &BurstAnalysis);
}

impl<F> AnalysisObserver for F
where
    F: Fn(&BurstAnalysis) + Send,
{
    fn on_analysis(&self, analysis: &BurstAnalysis) {
        self(analysis)
    }
}

/// Logs every analysis at debug level while enabled.
pub struct TracingObserver {
    enabled: Arc<AtomicBool>,
}

impl TracingObserver {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Shared switch so tracing can be toggled after the observer is installed.
    pub fn switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }
}

impl AnalysisObserver for TracingObserver {
    fn on_analysis(&self, a: &BurstAnalysis) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        tracing::debug!(
            trigger = %a.trigger,
            len = a.char_count,
            elapsed_ms = a.elapsed.as_millis() as u64,
            ms_per_char = a.ms_per_char,
            all_digits = a.all_digits,
            alnum_no_spaces = a.alnum_no_spaces,
            is_fast = a.is_fast,
            is_barcode_length = a.is_barcode_length,
            "burst {}",
            a.decision,
        );
    }
}

/// Forwards a copy of every analysis over a channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<BurstAnalysis>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<BurstAnalysis>) -> Self {
        Self { tx }
    }
}

impl AnalysisObserver for ChannelObserver {
    fn on_analysis(&self, analysis: &BurstAnalysis) {
        let _ = self.tx.send(analysis.clone());
    }
}
