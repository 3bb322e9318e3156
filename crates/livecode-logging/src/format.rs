//! Line rendering for log entries.

use crate::types::LogMessage;

/// Placeholder for the severity name.
pub const TYPE_SLOT: &str = "{{type}}";
/// Placeholder for the caller label.
pub const CALLER_SLOT: &str = "{{caller}}";
/// Placeholder for the message text.
pub const MESSAGE_SLOT: &str = "{{message}}";
/// Placeholder for the repeat counter.
pub const COUNT_SLOT: &str = "{{count}}";
/// Placeholder for the `HH:MM:SS` UTC time of the first occurrence.
pub const TIME_SLOT: &str = "{{time}}";

/// Render `message` through a template such as `"[{{type}}] {{caller}}: {{message}}"`.
///
/// The message text is substituted last so that braces inside it are never
/// interpreted as slots.
#[must_use]
pub fn format_message(format: &str, message: &LogMessage) -> String {
    format
        .replace(TYPE_SLOT, &message.severity.to_string())
        .replace(CALLER_SLOT, &message.caller)
        .replace(COUNT_SLOT, &message.count.to_string())
        .replace(TIME_SLOT, &message.timestamp.format("%H:%M:%S").to_string())
        .replace(MESSAGE_SLOT, &message.text)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::Severity;

    fn sample(text: &str) -> LogMessage {
        LogMessage {
            id: 7,
            caller: "Runner::on_load".to_string(),
            text: text.to_string(),
            severity: Severity::Warning,
            count: 3,
            trace: None,
            timestamp: chrono::Utc.with_ymd_and_hms(2026, 1, 2, 13, 4, 5).unwrap(),
        }
    }

    #[test]
    fn default_template() {
        let line = format_message("[{{type}}] {{caller}}: {{message}}", &sample("careful"));
        assert_eq!(line, "[warning] Runner::on_load: careful");
    }

    #[test]
    fn count_and_time_slots() {
        let line = format_message("{{time}} {{message}} (x{{count}})", &sample("again"));
        assert_eq!(line, "13:04:05 again (x3)");
    }

    #[test]
    fn braces_in_text_are_literal() {
        let line = format_message("{{message}}", &sample("literal {{type}}"));
        assert_eq!(line, "literal {{type}}");
    }

    #[test]
    fn template_without_slots() {
        assert_eq!(format_message("plain", &sample("x")), "plain");
    }
}
