//! Compiles a [`CompileUnit`] into a loadable artifact.
//!
//! [`CompilerAdapter`] owns the workspace side (writing sources, checking the
//! artifact, cleaning up after failures). The actual compiler sits behind the
//! [`Toolchain`] trait so tests can substitute it; [`Rustc`] is the real one.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use livecode_settings::ToolchainSettings;
use tracing::{debug, warn};

use crate::errors::CompileError;
use crate::snippet::CompileUnit;
use crate::workspace::CompileRequest;

/// Crate name every unit is compiled under.
pub const CRATE_NAME: &str = "livecode_snippet";

/// Language edition of generated units.
pub const EDITION: &str = "2021";

// ─────────────────────────────────────────────────────────────────────────────
// References
// ─────────────────────────────────────────────────────────────────────────────

/// One `--extern name=path` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternReference {
    /// Crate name seen by the snippet.
    pub name: String,
    /// Compiled library path.
    pub path: PathBuf,
}

/// Libraries and search paths every unit is compiled against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    externs: Vec<ExternReference>,
    search_paths: Vec<PathBuf>,
}

impl ReferenceSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// References configured in settings.
    #[must_use]
    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        let mut set = Self::new();
        for reference in &settings.references {
            set = set.with_extern(&reference.name, &reference.path);
        }
        for path in &settings.library_paths {
            set = set.with_search_path(path);
        }
        set
    }

    /// Add an extern crate.
    #[must_use]
    pub fn with_extern(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.externs.push(ExternReference {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    /// Add a library search path.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Extern crates in configuration order.
    #[must_use]
    pub fn externs(&self) -> &[ExternReference] {
        &self.externs
    }

    /// Search paths in configuration order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Fail on the first extern whose path does not exist.
    pub fn verify(&self) -> Result<(), CompileError> {
        match self.externs.iter().find(|r| !r.path.exists()) {
            Some(missing) => Err(CompileError::MissingReference {
                name: missing.name.clone(),
                path: missing.path.clone(),
            }),
            None => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toolchain
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a toolchain needs to build one artifact.
#[derive(Clone, Debug)]
pub struct CompileInvocation {
    /// Crate root on disk.
    pub root: PathBuf,
    /// Artifact to produce.
    pub output: PathBuf,
    /// `-C opt-level`.
    pub opt_level: u8,
    /// Externs and search paths.
    pub references: ReferenceSet,
    /// Extra arguments placed before the crate root.
    pub extra_args: Vec<String>,
}

impl CompileInvocation {
    /// `rustc` command line, without the program.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--crate-type",
            "cdylib",
            "--crate-name",
            CRATE_NAME,
            "--edition",
            EDITION,
            "--color",
            "never",
            "-C",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(format!("opt-level={}", self.opt_level).into());

        for path in self.references.search_paths() {
            args.push("-L".into());
            args.push(path.clone().into_os_string());
        }
        for reference in self.references.externs() {
            args.push("--extern".into());
            let mut spec = OsString::from(format!("{}=", reference.name));
            spec.push(&reference.path);
            args.push(spec);
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push("-o".into());
        args.push(self.output.clone().into_os_string());
        args.push(self.root.clone().into_os_string());
        args
    }
}

/// What a toolchain run produced.
#[derive(Clone, Debug, Default)]
pub struct ToolchainOutput {
    /// Whether the toolchain exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall time of the run.
    pub duration_ms: u64,
}

impl ToolchainOutput {
    /// Diagnostics text: stderr, else stdout, else the exit status.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("compiler exited with status {code}"),
            None => "compiler was terminated by a signal".to_string(),
        }
    }
}

/// Compiler backend.
pub trait Toolchain: Send + Sync {
    /// Build `invocation.output` from `invocation.root`.
    ///
    /// `Err` is reserved for failures to run the toolchain at all; a
    /// rejected unit is `Ok` with `success == false`.
    fn compile(&self, invocation: &CompileInvocation) -> io::Result<ToolchainOutput>;
}

/// `rustc` run as a child process.
#[derive(Clone, Debug)]
pub struct Rustc {
    program: PathBuf,
}

impl Rustc {
    /// Use an explicit program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find `rustc` from the environment.
    ///
    /// Order: `LIVECODE_RUSTC`, `RUSTC`, the `rustc` next to `$CARGO`, then
    /// `rustc` on `PATH`.
    #[must_use]
    pub fn discover() -> Self {
        Self::new(discover_program(|key| std::env::var(key).ok()))
    }

    /// Configured program, or [`discover`](Self::discover).
    #[must_use]
    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        match settings.rustc.as_deref().filter(|p| !p.is_empty()) {
            Some(program) => Self::new(program),
            None => Self::discover(),
        }
    }

    /// Program that will be spawned.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Resolve the compiler program through `lookup` (an env reader).
pub fn discover_program(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    for key in ["LIVECODE_RUSTC", "RUSTC"] {
        if let Some(program) = lookup(key).filter(|v| !v.is_empty()) {
            return PathBuf::from(program);
        }
    }
    if let Some(cargo) = lookup("CARGO").filter(|v| !v.is_empty()) {
        let sibling =
            Path::new(&cargo).with_file_name(format!("rustc{}", std::env::consts::EXE_SUFFIX));
        if sibling.is_file() {
            return sibling;
        }
    }
    PathBuf::from("rustc")
}

impl Toolchain for Rustc {
    fn compile(&self, invocation: &CompileInvocation) -> io::Result<ToolchainOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        let _ = cmd
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(
            program = %self.program.display(),
            root = %invocation.root.display(),
            "spawning compiler"
        );

        let output = cmd.output()?;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let exit_code = output.status.code();
        debug!(?exit_code, duration_ms, "compiler finished");

        Ok(ToolchainOutput {
            success: output.status.success(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────────────────────────────────────

/// Writes a unit into a request and drives the toolchain.
pub struct CompilerAdapter {
    toolchain: Box<dyn Toolchain>,
    references: ReferenceSet,
    opt_level: u8,
    extra_args: Vec<String>,
}

impl CompilerAdapter {
    /// Adapter with no references, `opt-level=0` and no extra arguments.
    pub fn new(toolchain: impl Toolchain + 'static) -> Self {
        Self {
            toolchain: Box::new(toolchain),
            references: ReferenceSet::new(),
            opt_level: 0,
            extra_args: Vec::new(),
        }
    }

    /// [`Rustc`] configured from settings.
    #[must_use]
    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        Self::new(Rustc::from_settings(settings))
            .with_references(ReferenceSet::from_settings(settings))
            .with_opt_level(settings.opt_level)
            .with_extra_args(settings.extra_args.clone())
    }

    /// Replace the reference set.
    #[must_use]
    pub fn with_references(mut self, references: ReferenceSet) -> Self {
        self.references = references;
        self
    }

    /// Set the optimization level.
    #[must_use]
    pub fn with_opt_level(mut self, opt_level: u8) -> Self {
        self.opt_level = opt_level;
        self
    }

    /// Set extra compiler arguments.
    #[must_use]
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Compile `unit` inside `request`.
    ///
    /// Returns the artifact path iff the artifact exists afterwards. On any
    /// failure the request's artifact directory is emptied.
    pub fn compile(
        &self,
        unit: &CompileUnit,
        request: &CompileRequest,
    ) -> Result<PathBuf, CompileError> {
        let result = self.try_compile(unit, request);
        if let Err(error) = &result {
            warn!(request = %request.id(), %error, "compile failed");
            if let Err(e) = request.clear_artifacts() {
                warn!(request = %request.id(), error = %e, "failed to clean artifact directory");
            }
        }
        result
    }

    fn try_compile(
        &self,
        unit: &CompileUnit,
        request: &CompileRequest,
    ) -> Result<PathBuf, CompileError> {
        let root = unit.root().ok_or(CompileError::EmptyUnit)?;
        self.references.verify()?;

        let mut seen = HashSet::new();
        let names = unit
            .files()
            .iter()
            .map(|file| file_name(&file.name))
            .collect::<Result<Vec<_>, _>>()?;
        for (file, name) in unit.files().iter().zip(&names) {
            if !seen.insert(*name) {
                return Err(CompileError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("duplicate source file name `{}` in unit", file.name),
                )));
            }
        }
        for (file, name) in unit.files().iter().zip(&names) {
            fs::write(request.source_dir().join(name), &file.text)?;
        }

        let output = request.artifact_path();
        let invocation = CompileInvocation {
            root: request.source_dir().join(file_name(&root.name)?),
            output: output.clone(),
            opt_level: self.opt_level,
            references: self.references.clone(),
            extra_args: self.extra_args.clone(),
        };

        let result = self.toolchain.compile(&invocation)?;
        if !result.success {
            return Err(CompileError::Failed {
                diagnostics: result.diagnostics(),
            });
        }
        if !output.is_file() {
            return Err(CompileError::ArtifactMissing { path: output });
        }

        debug!(
            request = %request.id(),
            duration_ms = result.duration_ms,
            "compile succeeded"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for CompilerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerAdapter")
            .field("references", &self.references)
            .field("opt_level", &self.opt_level)
            .field("extra_args", &self.extra_args)
            .finish_non_exhaustive()
    }
}

/// Final path component of a unit file name.
fn file_name(name: &str) -> Result<&std::ffi::OsStr, CompileError> {
    Path::new(name).file_name().ok_or_else(|| {
        CompileError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid source file name `{name}`"),
        ))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
