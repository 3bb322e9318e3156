//! Error types for the snippet pipeline.
//!
//! - [`WorkspaceError`]: scratch directory setup and request allocation
//! - [`CompileError`]: everything that can go wrong before an artifact exists
//! - [`ExecutionError`]: the single outcome category reported for a failed
//!   submission. Its `Display` text is what the console log shows.

use std::io;
use std::path::PathBuf;

use livecode_logging::Severity;
use thiserror::Error;

/// Scratch workspace failures.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The root could not be created or cleaned. Fatal for console startup.
    #[error("failed to initialize workspace at {}: {source}", path.display())]
    Init {
        /// Workspace root.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The root already holds files that a previous console did not create.
    /// Nothing was deleted.
    #[error(
        "refusing to use {} as workspace: it is not empty and has no {marker} marker",
        path.display()
    )]
    NotOwned {
        /// Workspace root.
        path: PathBuf,
        /// Marker file name that was looked for.
        marker: &'static str,
    },

    /// No fresh request directory pair could be created.
    #[error("failed to allocate a compile request after {attempts} attempts: {source}")]
    Allocate {
        /// Attempts made before giving up.
        attempts: u32,
        /// Last I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Compile phase failures.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The unit had no files to compile.
    #[error("compile unit has no files")]
    EmptyUnit,

    /// A configured reference does not exist on disk.
    #[error("reference `{name}` not found at {}", path.display())]
    MissingReference {
        /// Crate name of the reference.
        name: String,
        /// Configured path.
        path: PathBuf,
    },

    /// The toolchain rejected the unit. Diagnostics are opaque text.
    #[error("{diagnostics}")]
    Failed {
        /// Compiler output.
        diagnostics: String,
    },

    /// The toolchain reported success but the artifact is absent.
    #[error("compiler produced no artifact at {}", path.display())]
    ArtifactMissing {
        /// Expected artifact path.
        path: PathBuf,
    },

    /// Writing sources or spawning the toolchain failed.
    #[error("compiler I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure category of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Compilation failed.
    CompileFailed,
    /// Compilation succeeded without an artifact.
    ArtifactMissing,
    /// The artifact could not be loaded.
    LoadFailed,
    /// The artifact registered no entry point.
    NoEntryPoint,
    /// The entry point could not be constructed.
    InstantiationFailed,
    /// The entry point raised while running.
    InvocationFailed,
}

/// Terminal failure of a submission.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Compilation failed.
    #[error("Failed to compile command-line:\n{diagnostics}")]
    CompileFailed {
        /// Compiler diagnostics.
        diagnostics: String,
    },

    /// Compilation succeeded without an artifact.
    #[error("Compiled command-line produced no artifact at {}", path.display())]
    ArtifactMissing {
        /// Expected artifact path.
        path: PathBuf,
    },

    /// The artifact could not be loaded.
    #[error("Failed to load compiled command-line: {reason}")]
    LoadFailed {
        /// Loader message.
        reason: String,
    },

    /// The artifact registered no entry point.
    #[error("Failed to find an entry point in the compiled command-line")]
    NoEntryPoint,

    /// The entry point could not be constructed.
    #[error("Failed to create an instance of `{entry_point}`")]
    InstantiationFailed {
        /// Registered type name.
        entry_point: String,
    },

    /// The entry point raised while running.
    #[error("Command-line raised: {message}")]
    InvocationFailed {
        /// Fault message reported by the unit.
        message: String,
    },
}

impl ExecutionError {
    /// Category of this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::CompileFailed { .. } => FailureKind::CompileFailed,
            Self::ArtifactMissing { .. } => FailureKind::ArtifactMissing,
            Self::LoadFailed { .. } => FailureKind::LoadFailed,
            Self::NoEntryPoint => FailureKind::NoEntryPoint,
            Self::InstantiationFailed { .. } => FailureKind::InstantiationFailed,
            Self::InvocationFailed { .. } => FailureKind::InvocationFailed,
        }
    }

    /// Severity of the log entry for this failure.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::InvocationFailed { .. } => Severity::Exception,
            _ => Severity::Error,
        }
    }
}

impl From<CompileError> for ExecutionError {
    fn from(error: CompileError) -> Self {
        match error {
            CompileError::ArtifactMissing { path } => Self::ArtifactMissing { path },
            CompileError::Failed { diagnostics } => Self::CompileFailed { diagnostics },
            other => Self::CompileFailed {
                diagnostics: other.to_string(),
            },
        }
    }
}

impl From<WorkspaceError> for ExecutionError {
    fn from(error: WorkspaceError) -> Self {
        Self::CompileFailed {
            diagnostics: error.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
