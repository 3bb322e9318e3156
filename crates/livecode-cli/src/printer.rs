//! Prints new log entries as they arrive.

use std::io::{self, Write};

use livecode_logging::{ConsoleLog, LogMessage, format_message};

/// Remembers what was already printed so each entry shows up once, plus
/// once more whenever its repeat counter grows.
#[derive(Debug)]
pub struct LogPrinter {
    format: String,
    last_id: u64,
    last_count: u64,
}

impl LogPrinter {
    /// Printer using a `{{type}}` / `{{caller}}` / `{{message}}` template.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            last_id: 0,
            last_count: 0,
        }
    }

    /// Replace the line template used for entries printed from now on.
    pub fn set_format(&mut self, format: impl Into<String>) {
        self.format = format.into();
    }

    /// Lines for entries not printed yet.
    pub fn pending_lines(&mut self, log: &ConsoleLog) -> Vec<String> {
        let mut lines = Vec::new();
        // the last printed entry is re-read to catch a grown repeat counter
        for entry in log.entries_since(self.last_id.saturating_sub(1)) {
            let fresh = entry.id > self.last_id;
            let repeated = entry.id == self.last_id && entry.count > self.last_count;
            if fresh || repeated {
                lines.push(self.render(&entry));
                self.last_id = entry.id;
                self.last_count = entry.count;
            }
        }
        lines
    }

    /// Write pending lines to `out`.
    pub fn flush_to(&mut self, log: &ConsoleLog, out: &mut impl Write) -> io::Result<()> {
        for line in self.pending_lines(log) {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }

    fn render(&self, entry: &LogMessage) -> String {
        let line = format_message(&self.format, entry);
        if entry.count > 1 {
            format!("{line} (x{})", entry.count)
        } else {
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use livecode_logging::Severity;

    use super::*;

    #[test]
    fn prints_each_entry_once() {
        let log = ConsoleLog::default();
        let mut printer = LogPrinter::new("[{{type}}] {{message}}");

        let _ = log.internal("a", Severity::Info);
        let _ = log.internal("b", Severity::Error);
        assert_eq!(printer.pending_lines(&log), ["[info] a", "[error] b"]);
        assert!(printer.pending_lines(&log).is_empty());
    }

    #[test]
    fn repeats_are_reprinted_with_count() {
        let log = ConsoleLog::default();
        let mut printer = LogPrinter::new("{{message}}");

        let _ = log.internal("tick", Severity::Info);
        assert_eq!(printer.pending_lines(&log), ["tick"]);

        let _ = log.internal("tick", Severity::Info);
        let _ = log.internal("tick", Severity::Info);
        assert_eq!(printer.pending_lines(&log), ["tick (x3)"]);
    }

    #[test]
    fn cleared_log_prints_only_new_entries() {
        let log = ConsoleLog::default();
        let mut printer = LogPrinter::new("{{message}}");
        let _ = log.internal("old", Severity::Info);
        let _ = printer.pending_lines(&log);

        log.clear();
        let _ = log.internal("new", Severity::Info);
        assert_eq!(printer.pending_lines(&log), ["new"]);
    }

    #[test]
    fn format_change_applies_to_new_entries() {
        let log = ConsoleLog::default();
        let mut printer = LogPrinter::new("{{message}}");
        let _ = log.internal("before", Severity::Info);
        assert_eq!(printer.pending_lines(&log), ["before"]);

        printer.set_format("[{{type}}] {{message}}");
        let _ = log.internal("after", Severity::Warning);
        assert_eq!(printer.pending_lines(&log), ["[warning] after"]);
    }

    #[test]
    fn flush_writes_lines() {
        let log = ConsoleLog::default();
        let mut printer = LogPrinter::new("{{caller}}: {{message}}");
        let _ = log.internal("ready", Severity::Info);

        let mut out = Vec::new();
        printer.flush_to(&log, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "livecode: ready\n");
    }
}
