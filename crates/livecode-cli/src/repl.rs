//! Line input for the console.
//!
//! A line ending in `\` continues on the next line. Lines starting with `:`
//! are console commands; everything else is a snippet.

/// One complete input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Snippet source to submit.
    Snippet(String),
    /// Snippet source to run without rolling the history (`:keep <code>`).
    Keep(String),
    /// Clear the log.
    Clear,
    /// Show the command history.
    History,
    /// Re-run the previous command.
    Again,
    /// Restore the log settings to their defaults.
    Reset,
    /// Write the current settings to the settings file.
    Save,
    /// Show command help.
    Help,
    /// Leave the console.
    Quit,
    /// Unrecognized `:` command.
    Unknown(String),
}

/// Help text for `:help`.
pub const HELP: &str = "\
Type Rust statements; they run inside the live process.
  log::message(..) / log::warning(..) / log::error(..) / console!(..)
End a line with \\ to continue on the next line.
Commands:
  :keep <code>  run without adding to history
  :again        run the previous command again
  :history      list previous commands
  :clear        clear the log
  :reset        restore default log settings
  :save         write settings to the settings file
  :help         show this text
  :quit         exit";

/// Joins continuation lines into complete inputs.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Option<String>,
}

impl LineAssembler {
    /// Whether a continuation is in progress.
    pub fn is_continuing(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one raw line. Returns an input once it is complete.
    pub fn push(&mut self, line: &str) -> Option<Input> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(head) = line.strip_suffix('\\') {
            let pending = self.pending.get_or_insert_with(String::new);
            pending.push_str(head);
            pending.push('\n');
            return None;
        }

        let text = match self.pending.take() {
            Some(mut pending) => {
                pending.push_str(line);
                return Some(Input::Snippet(pending));
            }
            None => line,
        };
        Some(parse(text))
    }

    /// Finish a dangling continuation at end of input.
    pub fn finish(&mut self) -> Option<Input> {
        self.pending.take().map(Input::Snippet)
    }
}

/// Classify a single complete line.
pub fn parse(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return Input::Snippet(line.to_string());
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));
    match name {
        "q" | "quit" | "exit" => Input::Quit,
        "clear" => Input::Clear,
        "history" => Input::History,
        "again" => Input::Again,
        "reset" => Input::Reset,
        "save" => Input::Save,
        "help" | "?" => Input::Help,
        "keep" => Input::Keep(rest.to_string()),
        other => Input::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_is_snippet() {
        assert_eq!(
            parse("log::message(\"hi\");"),
            Input::Snippet("log::message(\"hi\");".into())
        );
    }

    #[test]
    fn commands() {
        assert_eq!(parse(":q"), Input::Quit);
        assert_eq!(parse("  :clear "), Input::Clear);
        assert_eq!(parse(":history"), Input::History);
        assert_eq!(parse(":again"), Input::Again);
        assert_eq!(parse(":help"), Input::Help);
        assert_eq!(parse(":reset"), Input::Reset);
        assert_eq!(parse(":save"), Input::Save);
        assert_eq!(parse(":keep  console!(\"x\");"), Input::Keep("console!(\"x\");".into()));
        assert_eq!(parse(":bogus"), Input::Unknown("bogus".into()));
    }

    #[test]
    fn continuation_lines_join() {
        let mut assembler = LineAssembler::default();
        assert_eq!(assembler.push("for i in 0..3 {\\\n"), None);
        assert!(assembler.is_continuing());
        assert_eq!(assembler.push("    console!(\"{i}\");\\"), None);
        assert_eq!(
            assembler.push("}\n"),
            Some(Input::Snippet(
                "for i in 0..3 {\n    console!(\"{i}\");\n}".into()
            ))
        );
        assert!(!assembler.is_continuing());
    }

    #[test]
    fn continued_input_is_never_a_command() {
        let mut assembler = LineAssembler::default();
        assert_eq!(assembler.push("let x = 1;\\"), None);
        assert_eq!(
            assembler.push(":quit"),
            Some(Input::Snippet("let x = 1;\n:quit".into()))
        );
    }

    #[test]
    fn finish_flushes_dangling_continuation() {
        let mut assembler = LineAssembler::default();
        assert_eq!(assembler.push("let x = 1;\\"), None);
        assert_eq!(assembler.finish(), Some(Input::Snippet("let x = 1;\n".into())));
        assert_eq!(assembler.finish(), None);
    }
}
