//! Tracing bridge into the console log.
//!
//! [`ConsoleLayer`] implements [`tracing_subscriber::Layer`] so that
//! application events emitted with `tracing` macros show up in the
//! scrollback next to snippet output. The event target becomes the caller
//! label and extra fields are appended as `key=value` pairs.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::buffer::ConsoleLog;
use crate::types::{Caller, Severity};

/// Target prefix of the console's own crates.
///
/// Their diagnostics go to stderr only, so a failing append can never feed
/// back into the log it is failing on.
pub const INTERNAL_TARGET_PREFIX: &str = "livecode_";

/// Layer that appends tracing events to a [`ConsoleLog`].
pub struct ConsoleLayer {
    log: Arc<ConsoleLog>,
    level: Level,
    ignored_prefixes: Vec<String>,
}

impl ConsoleLayer {
    /// Forward events at `INFO` and above.
    #[must_use]
    pub fn new(log: Arc<ConsoleLog>) -> Self {
        Self {
            log,
            level: Level::INFO,
            ignored_prefixes: vec![INTERNAL_TARGET_PREFIX.to_string()],
        }
    }

    /// Most verbose level still forwarded.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Drop events whose target starts with `prefix`.
    #[must_use]
    pub fn ignore_target(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_prefixes.push(prefix.into());
        self
    }

    /// Forward every target, including the console's own crates.
    #[must_use]
    pub fn forward_all_targets(mut self) -> Self {
        self.ignored_prefixes.clear();
        self
    }

    fn accepts(&self, level: &Level, target: &str) -> bool {
        // more verbose levels compare greater
        if *level > self.level {
            return false;
        }
        !self
            .ignored_prefixes
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

/// Visitor that renders an event into a single line.
#[derive(Default)]
struct EventTextVisitor {
    message: Option<String>,
    fields: String,
}

impl EventTextVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }

    fn into_text(self) -> String {
        match (self.message, self.fields.is_empty()) {
            (Some(message), true) => message,
            (Some(message), false) => format!("{message} {}", self.fields),
            (None, _) => self.fields,
        }
    }
}

impl Visit for EventTextVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.accepts(metadata.level(), metadata.target()) {
            return;
        }

        let mut visitor = EventTextVisitor::default();
        event.record(&mut visitor);

        let _ = self.log.append(
            Caller::Named(metadata.target().to_string()),
            visitor.into_text(),
            Severity::from_tracing(metadata.level()),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
