//! Wraps operator text into a compilable unit.
//!
//! The command is pasted verbatim into the body of
//! `CommandLineRunner::on_load` inside a fixed crate-root template. The
//! template also carries the snippet-facing log API (`log::message`,
//! `log::warning`, `log::error`, `console!`) and the generated half of the
//! entry-point ABI. Nothing is validated here; syntax errors surface from the
//! compiler.

use livecode_settings::{ToolchainSettings, default_prelude};

/// Crate-root template for a command-line submission.
pub const TEMPLATE: &str = include_str!("command_line.rs.in");

/// File name of the wrapped command.
pub const ENTRY_FILE_NAME: &str = "command_line.rs";

/// Type that receives the command body.
pub const ENTRY_TYPE_NAME: &str = "CommandLineRunner";

const PRELUDE_MARKER: &str = "/*@PRELUDE@*/";
const BODY_MARKER: &str = "/*@BODY@*/";

/// One named source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Relative file name. Only the final component is used when written.
    pub name: String,
    /// Source text.
    pub text: String,
}

impl SourceFile {
    /// Create a source file.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Ordered files compiled together. The first file is the crate root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileUnit {
    files: Vec<SourceFile>,
}

impl CompileUnit {
    /// Unit from an ordered list of files.
    #[must_use]
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }

    /// Unit with exactly one file.
    pub fn single(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(vec![SourceFile::new(name, text)])
    }

    /// All files in submission order.
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Crate root, if the unit has any files.
    #[must_use]
    pub fn root(&self) -> Option<&SourceFile> {
        self.files.first()
    }

    /// Whether the unit has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Renders command text into the crate-root template.
#[derive(Clone, Debug)]
pub struct SnippetTemplate {
    prelude: Vec<String>,
}

impl SnippetTemplate {
    /// Template with the given prelude lines.
    #[must_use]
    pub fn new(prelude: Vec<String>) -> Self {
        Self { prelude }
    }

    /// Template with the configured prelude.
    #[must_use]
    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        Self::new(settings.prelude.clone())
    }

    /// Prelude lines placed above every snippet.
    #[must_use]
    pub fn prelude(&self) -> &[String] {
        &self.prelude
    }

    /// Full crate-root source for `command`.
    #[must_use]
    pub fn render(&self, command: &str) -> String {
        TEMPLATE
            .replacen(PRELUDE_MARKER, &self.prelude.join("\n"), 1)
            .replacen(BODY_MARKER, command, 1)
    }

    /// Wrap `command` into a single-file unit named [`ENTRY_FILE_NAME`].
    #[must_use]
    pub fn wrap(&self, command: &str) -> CompileUnit {
        CompileUnit::single(ENTRY_FILE_NAME, self.render(command))
    }
}

impl Default for SnippetTemplate {
    fn default() -> Self {
        Self::new(default_prelude())
    }
}
