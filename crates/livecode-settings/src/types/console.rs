//! Scrollback log and command line settings.

use serde::{Deserialize, Serialize};

/// Console log behavior.
///
/// The reveal flags decide which severities force the log view to become
/// visible when a message arrives. Rendering itself belongs to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleSettings {
    /// Maximum number of entries kept in the scrollback log.
    pub max_history_length: usize,
    /// Line template with `{{type}}`, `{{caller}}` and `{{message}}` slots.
    pub format_string: String,
    /// Reveal the log on informational messages.
    pub show_on_message: bool,
    /// Reveal the log on warnings.
    pub show_on_warning: bool,
    /// Reveal the log on errors and exceptions.
    pub show_on_error: bool,
    /// Request a scroll to the newest entry on every append.
    pub auto_scroll_to_bottom: bool,
    /// Forward application `tracing` events into the console log.
    pub forward_tracing: bool,
    /// Record host panics in the console log.
    pub log_panics: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            max_history_length: 1024,
            format_string: "[{{type}}] {{caller}}: {{message}}".to_string(),
            show_on_message: false,
            show_on_warning: false,
            show_on_error: true,
            auto_scroll_to_bottom: true,
            forward_tracing: true,
            log_panics: true,
        }
    }
}

impl ConsoleSettings {
    /// Restore the log-related fields to their defaults.
    ///
    /// Forwarding and panic capture are installed once at startup and are
    /// left as they are.
    pub fn reset_log_fields(&mut self) {
        let template = Self::default();
        self.max_history_length = template.max_history_length;
        self.format_string = template.format_string;
        self.show_on_message = template.show_on_message;
        self.show_on_warning = template.show_on_warning;
        self.show_on_error = template.show_on_error;
    }
}
