//! Logging types shared across the crate.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::Location;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a console message.
///
/// The numeric codes are part of the snippet ABI: generated units pass them
/// through the host `log` callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Ordinary output.
    Info = 0,
    /// Something looks off but execution continued.
    Warning = 1,
    /// An operation failed.
    Error = 2,
    /// Code raised a fault (panic) that was caught at a boundary.
    Exception = 3,
}

impl Severity {
    /// ABI code for this severity.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode an ABI code. Unknown codes are treated as [`Severity::Info`].
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Warning,
            2 => Self::Error,
            3 => Self::Exception,
            _ => Self::Info,
        }
    }

    /// Convert from tracing level.
    #[must_use]
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            _ => Self::Info,
        }
    }

    /// Errors and exceptions share one reveal switch.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Exception)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Exception => write!(f, "exception"),
        }
    }
}

/// Who wrote a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    /// The console machinery itself.
    Internal,
    /// A call site captured with `#[track_caller]`.
    Location(&'static Location<'static>),
    /// An explicit label (tracing target, snippet entry point, ...).
    Named(String),
}

impl Caller {
    /// Label used for [`Caller::Internal`].
    pub const INTERNAL_LABEL: &'static str = "livecode";

    /// Capture the caller of the current function.
    #[must_use]
    #[track_caller]
    pub fn here() -> Self {
        Self::Location(Location::caller())
    }

    /// Text shown in the `{{caller}}` slot.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Internal => Self::INTERNAL_LABEL.to_string(),
            Self::Location(location) => format!("{}:{}", location.file(), location.line()),
            Self::Named(name) => name.clone(),
        }
    }
}

impl From<&str> for Caller {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for Caller {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// One entry of the scrollback log.
#[derive(Clone, Debug)]
pub struct LogMessage {
    /// Sequence number, unique for the lifetime of the log.
    pub id: u64,
    /// Rendered caller label.
    pub caller: String,
    /// Message text.
    pub text: String,
    /// Severity.
    pub severity: Severity,
    /// How many consecutive times this `(text, severity)` arrived. Always ≥ 1.
    pub count: u64,
    /// Stack captured at the first occurrence, when backtraces are enabled.
    pub trace: Option<Arc<Backtrace>>,
    /// Time of the first occurrence.
    pub timestamp: DateTime<Utc>,
}

impl LogMessage {
    /// Whether `(text, severity)` collapses into this entry.
    #[must_use]
    pub fn is_repeat_of(&self, text: &str, severity: Severity) -> bool {
        self.severity == severity && self.text == text
    }
}

#[cfg(test)]
thread_local! {
    /// Capture attempts made on this thread.
    pub(crate) static CAPTURES: std::cell::Cell<u32> = const { std::cell::Cell::new(0) };
}

/// Capture a backtrace if the environment enables them.
///
/// Internal messages skip capture; their origin is the console itself.
pub(crate) fn capture_trace(caller: &Caller) -> Option<Arc<Backtrace>> {
    if matches!(caller, Caller::Internal) {
        return None;
    }
    #[cfg(test)]
    CAPTURES.with(|n| n.set(n.get() + 1));
    let trace = Backtrace::capture();
    (trace.status() == BacktraceStatus::Captured).then(|| Arc::new(trace))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_codes_roundtrip() {
        for severity in [
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Exception,
        ] {
            assert_eq!(Severity::from_code(severity.code()), severity);
        }
        assert_eq!(Severity::from_code(42), Severity::Info);
    }

    #[test]
    fn severity_from_tracing() {
        assert_eq!(Severity::from_tracing(&tracing::Level::ERROR), Severity::Error);
        assert_eq!(Severity::from_tracing(&tracing::Level::WARN), Severity::Warning);
        assert_eq!(Severity::from_tracing(&tracing::Level::INFO), Severity::Info);
        assert_eq!(Severity::from_tracing(&tracing::Level::TRACE), Severity::Info);
    }

    #[test]
    fn severity_serde_and_display() {
        assert_eq!(
            serde_json::to_string(&Severity::Exception).unwrap(),
            "\"exception\""
        );
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn failure_severities() {
        assert!(Severity::Error.is_failure());
        assert!(Severity::Exception.is_failure());
        assert!(!Severity::Warning.is_failure());
    }

    #[test]
    fn caller_labels() {
        assert_eq!(Caller::Internal.label(), "livecode");
        assert_eq!(Caller::from("app::net").label(), "app::net");

        let here = Caller::here();
        let label = here.label();
        assert!(label.contains("types.rs:"), "{label}");
    }

    #[test]
    fn internal_caller_has_no_trace() {
        assert!(capture_trace(&Caller::Internal).is_none());
    }
}
