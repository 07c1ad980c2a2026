use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Captures log lines for the monitor's Logs tab.
///
/// Structured fields are kept after the message as `key=value` pairs so
/// classifier traces stay readable without the fmt layer.
pub struct MonitorLogLayer {
    buffer: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl MonitorLogLayer {
    pub fn new(buffer: Arc<Mutex<VecDeque<String>>>, capacity: usize) -> Self {
        Self {
            buffer,
            capacity: capacity.max(1),
        }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        let _ = write!(self.fields, " {name}={value}");
    }
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for MonitorLogLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = format!(
            "[{}] {}: {}{}",
            metadata.level(),
            metadata.target(),
            visitor.message,
            visitor.fields
        );

        if let Ok(mut buf) = self.buffer.lock() {
            while buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(line);
        }
    }
}
