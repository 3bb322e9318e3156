#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use livecode_logging::ConsoleLog;
use livecode_runtime::{CompileUnit, CompilerAdapter, Console, Rustc, Workspace};
use livecode_settings::LivecodeSettings;

/// Line of the snippet template that registers the default entry point.
pub const DEFAULT_REGISTRATION: &str = "host::register::<CommandLineRunner>(registrar);";

/// Workspace plus real compiler for building hand-written units.
pub struct Harness {
    _tmp: tempfile::TempDir,
    pub workspace: Workspace,
    pub compiler: CompilerAdapter,
}

impl Harness {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::initialize(tmp.path().join("workspace")).unwrap();
        Self {
            _tmp: tmp,
            workspace,
            compiler: CompilerAdapter::new(Rustc::discover()),
        }
    }

    /// Compile `source` as a crate root and return the artifact path.
    pub fn build(&self, source: &str) -> PathBuf {
        let request = self.workspace.allocate_request().unwrap();
        let unit = CompileUnit::single("command_line.rs", source);
        self.compiler
            .compile(&unit, &request)
            .unwrap_or_else(|e| panic!("unit failed to compile:\n{e}"))
    }
}

/// Console whose workspace lives under `root`.
pub fn console_in(root: &Path) -> Console {
    let mut settings = LivecodeSettings::default();
    settings.workspace.path = Some(root.to_string_lossy().into_owned());
    Console::new(&settings, Arc::new(ConsoleLog::default())).unwrap()
}

/// Texts of all log entries, oldest first.
pub fn texts(log: &ConsoleLog) -> Vec<String> {
    log.snapshot().into_iter().map(|m| m.text).collect()
}

/// Number of loadable libraries under every request artifact directory.
pub fn artifact_count(root: &Path) -> usize {
    std::fs::read_dir(root.join("dll"))
        .unwrap()
        .flat_map(|entry| std::fs::read_dir(entry.unwrap().path()).unwrap())
        .filter(|file| {
            file.as_ref().unwrap().path().extension()
                == Some(std::ffi::OsStr::new(std::env::consts::DLL_EXTENSION))
        })
        .count()
}
