//! # livecode
//!
//! Line-oriented host for the livecode console: reads snippets from stdin,
//! runs them inside this process and prints the console log.

#![deny(unsafe_code)]

mod printer;
mod repl;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use livecode_logging::{ConsoleLog, LogPolicy, Severity};
use livecode_runtime::{Console, SubmitMode};
use livecode_settings::LivecodeSettings;

use crate::printer::LogPrinter;
use crate::repl::{HELP, Input, LineAssembler};

/// Interactive Rust snippet console.
#[derive(Parser, Debug)]
#[command(name = "livecode", version, about = "Compile and run Rust snippets in-process")]
struct Cli {
    /// Settings file (defaults to `~/.livecode/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Scratch workspace root. Must be empty or a previous livecode
    /// workspace; it is wiped on startup.
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Compiler program.
    #[arg(long)]
    rustc: Option<String>,

    /// Stderr log filter (overrides settings; `RUST_LOG` wins over both).
    #[arg(long)]
    log_level: Option<String>,

    /// Run one snippet, print the log and exit. Exits with status 1 if the
    /// snippet failed.
    #[arg(long, short = 'e')]
    eval: Option<String>,
}

impl Cli {
    fn settings_file(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(livecode_settings::settings_path)
    }

    fn load_settings(&self) -> Result<LivecodeSettings> {
        let path = self.settings_file();
        let mut settings = livecode_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        if let Some(workspace) = &self.workspace {
            settings.workspace.path = Some(workspace.to_string_lossy().into_owned());
        }
        if let Some(rustc) = &self.rustc {
            settings.toolchain.rustc = Some(rustc.clone());
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        Ok(settings)
    }
}

/// State of one interactive run.
struct Session {
    console: Console,
    printer: LogPrinter,
    settings: LivecodeSettings,
    settings_file: PathBuf,
}

impl Session {
    fn reset_log_settings(&mut self) {
        self.settings.console.reset_log_fields();
        self.console.apply_settings(&self.settings.console);
        self.printer
            .set_format(self.settings.console.format_string.clone());
        let _ = self
            .console
            .log()
            .internal("log settings reset to defaults", Severity::Info);
    }

    fn save_settings(&self) {
        let log = self.console.log();
        match livecode_settings::save_settings_to_path(&self.settings, &self.settings_file) {
            Ok(()) => {
                let _ = log.internal(
                    format!("settings saved to {}", self.settings_file.display()),
                    Severity::Info,
                );
            }
            Err(e) => {
                let _ = log.internal(format!("failed to save settings: {e}"), Severity::Error);
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    let log = Arc::new(ConsoleLog::new(LogPolicy::from(&settings.console)));
    if settings.console.forward_tracing {
        let _ = livecode_logging::init_subscriber_with_console(
            &settings.logging.level,
            Arc::clone(&log),
        );
    } else {
        livecode_logging::init_subscriber(&settings.logging.level);
    }
    if settings.console.log_panics {
        livecode_logging::install_panic_hook(Arc::clone(&log));
    }

    let console = Console::new(&settings, Arc::clone(&log))
        .context("Failed to initialize the console workspace")?;
    tracing::debug!(workspace = ?settings.workspace.path, "console ready");

    let mut session = Session {
        console,
        printer: LogPrinter::new(settings.console.format_string.clone()),
        settings_file: cli.settings_file(),
        settings,
    };
    let mut stdout = io::stdout();

    if let Some(snippet) = cli.eval {
        session.console.set_command_line(snippet);
        let _ = session.console.submit(SubmitMode::Roll);
        session.printer.flush_to(&log, &mut stdout)?;
        let failed = log.last().is_some_and(|entry| entry.severity.is_failure());
        return Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS });
    }

    run_repl(&mut session, &mut stdout)?;
    Ok(ExitCode::SUCCESS)
}

fn run_repl(session: &mut Session, out: &mut impl Write) -> Result<()> {
    let stdin = io::stdin();
    let mut assembler = LineAssembler::default();
    let mut line = String::new();

    loop {
        write!(out, "{}", if assembler.is_continuing() { ".. " } else { ">> " })?;
        out.flush()?;

        line.clear();
        let input = if stdin.lock().read_line(&mut line)? == 0 {
            match assembler.finish() {
                Some(input) => input,
                None => break,
            }
        } else {
            match assembler.push(&line) {
                Some(input) => input,
                None => continue,
            }
        };

        let console = &mut session.console;
        match input {
            Input::Snippet(code) => {
                console.set_command_line(code);
                let _ = console.submit(SubmitMode::Roll);
            }
            Input::Keep(code) => {
                let previous = console.command_line().to_string();
                console.set_command_line(code);
                let _ = console.submit(SubmitMode::Keep);
                console.set_command_line(previous);
            }
            Input::Again => {
                if console.history_mut().recall_previous() {
                    let _ = console.submit(SubmitMode::Roll);
                } else {
                    writeln!(out, "no previous command")?;
                }
            }
            Input::History => {
                let entries = console.history().entries();
                for (index, entry) in entries.iter().enumerate().take(entries.len() - 1) {
                    writeln!(out, "{index:>4}  {}", entry.replace('\n', "\n      "))?;
                }
            }
            Input::Clear => console.log().clear(),
            Input::Reset => session.reset_log_settings(),
            Input::Save => session.save_settings(),
            Input::Help => writeln!(out, "{HELP}")?,
            Input::Quit => break,
            Input::Unknown(name) => {
                let _ = console
                    .log()
                    .internal(format!("unknown command `:{name}`, try :help"), Severity::Warning);
            }
        }

        session.printer.flush_to(session.console.log(), out)?;
    }

    session.printer.flush_to(session.console.log(), out)?;
    Ok(())
}
