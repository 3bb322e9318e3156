//! Console facade: command line, history and execution wired to the log.
//!
//! Every non-blank submission writes an echo of the command followed by
//! exactly one terminal entry: `Executed command-line` on success, or the
//! failure text with its category's severity. `submit` never returns an
//! error and never unwinds; faults on the host side of the pipeline are
//! caught and logged as exceptions.

use std::sync::Arc;

use livecode_logging::{ConsoleLog, LogPolicy, Severity, contain_panics, panic_message};
use livecode_settings::{ConsoleSettings, LivecodeSettings};
use tracing::{debug, warn};

use crate::errors::{FailureKind, WorkspaceError};
use crate::executor::{Executor, NativeExecutor};
use crate::history::CommandHistory;
use crate::snippet::SnippetTemplate;

/// Log text of a successful submission.
pub const EXECUTED_MESSAGE: &str = "Executed command-line";

/// Prefix of a host-side fault caught during a submission.
pub const CONSOLE_EXCEPTION_PREFIX: &str = "Exception in console - ";

/// Whether a submission rolls the history forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// Run, then append a new active slot.
    #[default]
    Roll,
    /// Run and leave the command line and history as they are.
    Keep,
}

/// Outcome of one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The entry point ran to completion.
    Executed,
    /// The pipeline reported a failure.
    Failed(FailureKind),
    /// The host side of the pipeline panicked.
    Faulted,
}

/// Interactive console over an [`Executor`].
pub struct Console {
    log: Arc<ConsoleLog>,
    history: CommandHistory,
    template: SnippetTemplate,
    executor: Box<dyn Executor>,
}

impl Console {
    /// Console backed by the native pipeline.
    ///
    /// Initializes (and wipes) the configured workspace.
    pub fn new(settings: &LivecodeSettings, log: Arc<ConsoleLog>) -> Result<Self, WorkspaceError> {
        let executor = NativeExecutor::from_settings(settings)?;
        log.set_policy(LogPolicy::from(&settings.console));
        Ok(Self::with_executor(
            log,
            SnippetTemplate::from_settings(&settings.toolchain),
            executor,
        ))
    }

    /// Console over any executor.
    pub fn with_executor(
        log: Arc<ConsoleLog>,
        template: SnippetTemplate,
        executor: impl Executor + 'static,
    ) -> Self {
        Self {
            log,
            history: CommandHistory::new(),
            template,
            executor: Box::new(executor),
        }
    }

    /// Shared log handle.
    #[must_use]
    pub fn log(&self) -> &Arc<ConsoleLog> {
        &self.log
    }

    /// Command history.
    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Mutable command history, for recall navigation.
    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    /// Text on the command line.
    #[must_use]
    pub fn command_line(&self) -> &str {
        self.history.current()
    }

    /// Replace the text on the command line.
    pub fn set_command_line(&mut self, text: impl Into<String>) {
        self.history.set_current(text);
    }

    /// Apply new console settings to the log.
    pub fn apply_settings(&self, settings: &ConsoleSettings) {
        self.log.set_policy(LogPolicy::from(settings));
    }

    /// Run the command line.
    ///
    /// Blank commands are ignored and return `None`. Otherwise the command is
    /// echoed, executed, its outcome logged, and then (in [`SubmitMode::Roll`])
    /// the history rolls forward whatever the outcome.
    pub fn submit(&mut self, mode: SubmitMode) -> Option<SubmissionOutcome> {
        let command = self.history.current().to_string();
        if command.trim().is_empty() {
            return None;
        }

        let _ = self.log.internal(format!("> {command}"), Severity::Info);
        let outcome = self.execute(&command);

        if mode == SubmitMode::Roll {
            let _ = self.history.submit();
        }
        Some(outcome)
    }

    fn execute(&self, command: &str) -> SubmissionOutcome {
        let unit = self.template.wrap(command);
        let executor = &self.executor;
        let log = &self.log;

        // contained, so an installed panic hook does not log a second entry
        match contain_panics(|| executor.execute(&unit, log)) {
            Ok(Ok(())) => {
                debug!("command-line executed");
                let _ = log.internal(EXECUTED_MESSAGE, Severity::Info);
                SubmissionOutcome::Executed
            }
            Ok(Err(error)) => {
                debug!(kind = ?error.kind(), "command-line failed");
                let _ = log.internal(error.to_string(), error.severity());
                SubmissionOutcome::Failed(error.kind())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "console faulted while executing command-line");
                let _ = log.internal(
                    format!("{CONSOLE_EXCEPTION_PREFIX}{message}"),
                    Severity::Exception,
                );
                SubmissionOutcome::Faulted
            }
        }
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("history", &self.history)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
