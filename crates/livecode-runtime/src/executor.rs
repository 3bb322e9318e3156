//! The execute contract: one compile unit in, one outcome out.

use livecode_logging::ConsoleLog;
use livecode_settings::LivecodeSettings;

use crate::compiler::CompilerAdapter;
use crate::errors::{ExecutionError, WorkspaceError};
use crate::loader::ArtifactLoader;
use crate::snippet::CompileUnit;
use crate::workspace::Workspace;

/// Runs compile units against the live process.
///
/// Implementations report every failure through the returned error and
/// never let a fault escape as a panic of their own making.
pub trait Executor: Send + Sync {
    /// Compile, load and run `unit`. Output of the unit goes to `log`.
    fn execute(&self, unit: &CompileUnit, log: &ConsoleLog) -> Result<(), ExecutionError>;
}

/// Native pipeline: scratch workspace, external compiler, dynamic loading.
#[derive(Debug)]
pub struct NativeExecutor {
    workspace: Workspace,
    compiler: CompilerAdapter,
    loader: ArtifactLoader,
}

impl NativeExecutor {
    /// Assemble from parts.
    #[must_use]
    pub fn new(workspace: Workspace, compiler: CompilerAdapter) -> Self {
        Self {
            workspace,
            compiler,
            loader: ArtifactLoader::new(),
        }
    }

    /// Initialize the configured workspace and compiler.
    ///
    /// The workspace root is wiped; failure here is fatal for the console.
    pub fn from_settings(settings: &LivecodeSettings) -> Result<Self, WorkspaceError> {
        let root = settings
            .workspace
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map_or_else(Workspace::default_root, Into::into);
        let workspace = Workspace::initialize(root)?;
        Ok(Self::new(
            workspace,
            CompilerAdapter::from_settings(&settings.toolchain),
        ))
    }

    /// Scratch workspace in use.
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Loader holding every library mapped so far.
    #[must_use]
    pub fn loader(&self) -> &ArtifactLoader {
        &self.loader
    }
}

impl Executor for NativeExecutor {
    fn execute(&self, unit: &CompileUnit, log: &ConsoleLog) -> Result<(), ExecutionError> {
        let request = self.workspace.allocate_request()?;
        let artifact = self.compiler.compile(unit, &request)?;
        let mut instance = self.loader.instantiate(&artifact)?;
        instance.start(log)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn from_settings_uses_configured_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("scratch");
        let mut settings = LivecodeSettings::default();
        settings.workspace.path = Some(root.to_string_lossy().into_owned());

        let executor = NativeExecutor::from_settings(&settings).unwrap();
        assert_eq!(executor.workspace().root(), root);
        assert!(root.join("src").is_dir());
        assert_eq!(executor.loader().loaded_count(), 0);
    }

    #[test]
    fn from_settings_fails_on_unusable_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, b"").unwrap();
        let mut settings = LivecodeSettings::default();
        settings.workspace.path = Some(file.to_string_lossy().into_owned());

        assert_matches!(
            NativeExecutor::from_settings(&settings),
            Err(WorkspaceError::Init { .. })
        );
    }

    #[test]
    fn empty_unit_fails_at_compile() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = NativeExecutor::new(
            Workspace::initialize(tmp.path()).unwrap(),
            CompilerAdapter::new(crate::compiler::Rustc::new("/nonexistent/rustc")),
        );
        let log = ConsoleLog::default();

        let result = executor.execute(&CompileUnit::default(), &log);
        assert_matches!(result, Err(ExecutionError::CompileFailed { .. }));
    }

    #[test]
    fn unspawnable_compiler_is_compile_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = NativeExecutor::new(
            Workspace::initialize(tmp.path()).unwrap(),
            CompilerAdapter::new(crate::compiler::Rustc::new("/nonexistent/rustc")),
        );
        let log = ConsoleLog::default();

        let unit = CompileUnit::single("command_line.rs", "");
        let result = executor.execute(&unit, &log);
        assert_matches!(result, Err(ExecutionError::CompileFailed { ref diagnostics }) if diagnostics.contains("I/O"));
    }
}
