//! Command-line history with an editable active slot.
//!
//! The history always holds at least one entry. The last entry is the slot
//! being typed into; recalling an older entry moves the cursor onto it, and
//! edits made there change that entry in place.

/// Ordered command history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl CommandHistory {
    /// History with a single empty active slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![String::new()],
            cursor: 0,
        }
    }

    /// Text at the cursor.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    /// Replace the text at the cursor.
    pub fn set_current(&mut self, text: impl Into<String>) {
        self.entries[self.cursor] = text.into();
    }

    /// Cursor position; `entries().len() - 1` is the active slot.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Take the text at the cursor for execution and roll forward.
    ///
    /// A new empty active slot is appended unless the last slot is already
    /// empty; the cursor always ends on the last slot.
    pub fn submit(&mut self) -> String {
        let text = self.entries[self.cursor].clone();
        if self.entries.last().is_some_and(|last| !last.is_empty()) {
            self.entries.push(String::new());
        }
        self.cursor = self.entries.len() - 1;
        text
    }

    /// Move to the previous entry. Returns `false` at the first entry.
    pub fn recall_previous(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move to the next entry. Returns `false` at the active slot.
    pub fn recall_next(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}
