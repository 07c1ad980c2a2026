//! Offline replay of recorded keystroke logs.
//!
//! A log is one event per line: an offset in milliseconds from the start of
//! the recording, an event kind, and an optional value.
//!
//! ```text
//! # offset_ms  kind     value
//! 0            char     1
//! 10           char     2
//! 20           enter
//! 400          focus
//! 500          modal    off
//! 600          context  price-field
//! ```
//!
//! `char space` stands for a literal space. `focus` and `modal` default to
//! `on`. Blank lines and lines starting with `#` are skipped.

use crate::buffer::InputEvent;
use crate::machine::BurstClassifier;
use crate::observer::ChannelObserver;
use keywedge_core::{BurstAnalysis, ClassifierTuning, ContextTag, ReplayError, ScanResult};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Character(char),
    Terminator,
    Focus(bool),
    Modal(bool),
    Context(ContextTag),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEntry {
    pub line: usize,
    pub offset: Duration,
    pub event: ReplayEvent,
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub analyses: Vec<BurstAnalysis>,
    pub scans: Vec<ScanResult>,
}

pub fn load_replay(path: &Path) -> Result<Vec<ReplayEntry>, ReplayError> {
    let content = std::fs::read_to_string(path)?;
    parse_replay(&content)
}

pub fn parse_replay(input: &str) -> Result<Vec<ReplayEntry>, ReplayError> {
    let mut entries = Vec::new();
    let mut last_offset = Duration::ZERO;

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let offset_field = fields.next().unwrap_or_default();
        let offset_ms: u64 = offset_field.parse().map_err(|_| ReplayError::Parse {
            line,
            reason: format!("invalid offset '{offset_field}'"),
        })?;
        let offset = Duration::from_millis(offset_ms);
        if offset < last_offset {
            return Err(ReplayError::NonMonotonic { line });
        }
        last_offset = offset;

        let kind = fields.next().ok_or_else(|| ReplayError::Parse {
            line,
            reason: "missing event kind".to_string(),
        })?;
        let value = fields.next();
        if let Some(extra) = fields.next() {
            return Err(ReplayError::Parse {
                line,
                reason: format!("unexpected trailing field '{extra}'"),
            });
        }

        let event = match kind {
            "char" => ReplayEvent::Character(parse_char(line, value)?),
            "enter" => ReplayEvent::Terminator,
            "focus" => ReplayEvent::Focus(parse_switch(line, value)?),
            "modal" => ReplayEvent::Modal(parse_switch(line, value)?),
            "context" => {
                let tag = value.ok_or_else(|| ReplayError::Parse {
                    line,
                    reason: "context needs a tag".to_string(),
                })?;
                ReplayEvent::Context(ContextTag::new(tag))
            }
            other => {
                return Err(ReplayError::Parse {
                    line,
                    reason: format!("unknown event kind '{other}'"),
                })
            }
        };

        entries.push(ReplayEntry {
            line,
            offset,
            event,
        });
    }

    Ok(entries)
}

fn parse_char(line: usize, value: Option<&str>) -> Result<char, ReplayError> {
    let value = value.ok_or_else(|| ReplayError::Parse {
        line,
        reason: "char needs a value".to_string(),
    })?;
    if value == "space" {
        return Ok(' ');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ReplayError::Parse {
            line,
            reason: format!("expected a single character, got '{value}'"),
        }),
    }
}

fn parse_switch(line: usize, value: Option<&str>) -> Result<bool, ReplayError> {
    match value {
        None | Some("on") => Ok(true),
        Some("off") => Ok(false),
        Some(other) => Err(ReplayError::Parse {
            line,
            reason: format!("expected 'on' or 'off', got '{other}'"),
        }),
    }
}

/// Drive a fresh [`BurstClassifier`] through `entries` on a synthetic clock.
///
/// Before each event any deadline already passed at that event's offset
/// fires; after the last event the pending deadline, if any, fires too.
pub fn run_replay(
    entries: &[ReplayEntry],
    tuning: ClassifierTuning,
    initial_context: ContextTag,
) -> ReplayReport {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut machine = BurstClassifier::new(tuning).with_context(initial_context);
    machine.add_observer(Box::new(ChannelObserver::new(tx)));

    let base = Instant::now();
    let mut report = ReplayReport::default();

    for entry in entries {
        let at = base + entry.offset;
        report.scans.extend(machine.on_timeout(at));

        match &entry.event {
            ReplayEvent::Character(ch) => {
                report.scans.extend(machine.on_character(InputEvent::new(*ch, at)))
            }
            ReplayEvent::Terminator => report.scans.extend(machine.on_terminator()),
            ReplayEvent::Focus(on) => machine.on_focus_changed(*on),
            ReplayEvent::Modal(on) => machine.on_modal_presented(*on),
            ReplayEvent::Context(tag) => machine.set_context(tag.clone()),
        }
    }

    if let Some(deadline) = machine.deadline() {
        report.scans.extend(machine.on_timeout(deadline));
    }

    drop(machine);
    while let Ok(analysis) = rx.try_recv() {
        report.analyses.push(analysis);
    }
    report
}
