use std::fmt;
use std::time::Duration;

/// Opaque label naming the UI surface that should receive scan results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextTag(String);

impl ContextTag {
    pub const NONE: &'static str = "none";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag used when no surface is eligible for scans.
    pub fn none() -> Self {
        Self(Self::NONE.to_string())
    }

    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContextTag {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Fast, barcode-length, barcode-shaped.
    High,
    /// Fast and long enough, pattern ignored.
    Medium,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => f.write_str("high"),
            Confidence::Medium => f.write_str("medium"),
        }
    }
}

/// A burst classified as scanner input.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub text: String,
    pub context: ContextTag,
    pub confidence: Confidence,
    pub char_count: usize,
    pub elapsed: Duration,
}

/// Per-route data handed to a sink alongside each scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMetadata {
    pub context: ContextTag,
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Scanned(Confidence),
    Typed,
    /// Nothing left after trimming.
    Empty,
}

impl Decision {
    pub fn is_scanned(&self) -> bool {
        matches!(self, Decision::Scanned(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Scanned(c) => write!(f, "scanned ({c})"),
            Decision::Typed => f.write_str("typed"),
            Decision::Empty => f.write_str("empty"),
        }
    }
}

/// What completed the burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timeout,
    Terminator,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Timeout => f.write_str("timeout"),
            Trigger::Terminator => f.write_str("terminator"),
        }
    }
}

/// Everything computed while classifying one burst. Used for tracing and
/// offline tuning of the thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstAnalysis {
    pub text: String,
    pub char_count: usize,
    pub elapsed: Duration,
    pub ms_per_char: f64,
    pub all_digits: bool,
    pub alnum_no_spaces: bool,
    pub is_fast: bool,
    pub is_barcode_length: bool,
    pub decision: Decision,
    pub trigger: Trigger,
}
