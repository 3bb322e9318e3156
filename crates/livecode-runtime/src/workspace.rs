//! Scratch workspace for compile requests.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/src/<id>/command_line.rs
//! <root>/dll/<id>/<id>.<so|dylib|dll>
//! ```
//!
//! The root is emptied when the workspace is initialized so artifacts from a
//! previous process never leak into this one. Only a root that is empty or
//! carries the [`MARKER_FILE`] written by an earlier initialization is ever
//! emptied. Nothing is removed afterwards: loaded libraries stay mapped for
//! the lifetime of the process.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::WorkspaceError;
use crate::ids::RequestId;

/// Directory holding per-request sources.
pub const SOURCES_DIR: &str = "src";
/// Directory holding per-request artifacts.
pub const ARTIFACTS_DIR: &str = "dll";

/// Written into every initialized root; its presence allows the next
/// initialization to wipe the root.
pub const MARKER_FILE: &str = ".livecode-workspace";

/// Fresh ids tried before allocation gives up.
const MAX_ALLOCATION_ATTEMPTS: u32 = 8;

/// Root scratch directory of one console.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    sources_root: PathBuf,
    artifacts_root: PathBuf,
}

impl Workspace {
    /// `<temp dir>/livecode`.
    #[must_use]
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join("livecode")
    }

    /// Create `root` if needed, delete everything inside it, and create the
    /// sources and artifacts roots.
    ///
    /// A non-empty root without [`MARKER_FILE`] is left untouched and
    /// reported as [`WorkspaceError::NotOwned`].
    pub fn initialize(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        let init_error = |source| WorkspaceError::Init {
            path: root.clone(),
            source,
        };

        fs::create_dir_all(&root).map_err(init_error)?;
        if !is_owned(&root).map_err(init_error)? {
            warn!(root = %root.display(), "workspace root holds foreign files, not wiping");
            return Err(WorkspaceError::NotOwned {
                path: root,
                marker: MARKER_FILE,
            });
        }
        empty_directory(&root).map_err(init_error)?;
        fs::write(root.join(MARKER_FILE), b"").map_err(init_error)?;

        let sources_root = root.join(SOURCES_DIR);
        let artifacts_root = root.join(ARTIFACTS_DIR);
        fs::create_dir(&sources_root).map_err(init_error)?;
        fs::create_dir(&artifacts_root).map_err(init_error)?;

        debug!(root = %root.display(), "workspace initialized");
        Ok(Self {
            root,
            sources_root,
            artifacts_root,
        })
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent of every request source directory.
    #[must_use]
    pub fn sources_root(&self) -> &Path {
        &self.sources_root
    }

    /// Parent of every request artifact directory.
    #[must_use]
    pub fn artifacts_root(&self) -> &Path {
        &self.artifacts_root
    }

    /// Create a fresh, empty `(src/<id>, dll/<id>)` pair.
    ///
    /// Directories are created exclusively, so two concurrent callers can
    /// never receive the same pair; a collision re-rolls the id.
    pub fn allocate_request(&self) -> Result<CompileRequest, WorkspaceError> {
        let mut last_error = None;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let id = RequestId::generate();
            let source_dir = self.sources_root.join(id.as_str());
            let artifact_dir = self.artifacts_root.join(id.as_str());

            match create_pair(&source_dir, &artifact_dir) {
                Ok(()) => {
                    debug!(%id, attempt, "compile request allocated");
                    return Ok(CompileRequest {
                        id,
                        source_dir,
                        artifact_dir,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(%id, attempt, "request directory collision, re-rolling");
                    last_error = Some(e);
                }
                Err(e) => {
                    return Err(WorkspaceError::Allocate {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }

        Err(WorkspaceError::Allocate {
            attempts: MAX_ALLOCATION_ATTEMPTS,
            source: last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::AlreadyExists)),
        })
    }
}

fn create_pair(source_dir: &Path, artifact_dir: &Path) -> io::Result<()> {
    fs::create_dir(source_dir)?;
    if let Err(e) = fs::create_dir(artifact_dir) {
        let _ = fs::remove_dir(source_dir);
        return Err(e);
    }
    Ok(())
}

/// Whether `root` is empty or was initialized by a console before.
fn is_owned(root: &Path) -> io::Result<bool> {
    if root.join(MARKER_FILE).is_file() {
        return Ok(true);
    }
    Ok(fs::read_dir(root)?.next().is_none())
}

fn empty_directory(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// One allocated directory pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileRequest {
    id: RequestId,
    source_dir: PathBuf,
    artifact_dir: PathBuf,
}

impl CompileRequest {
    /// Request id; also the artifact file stem.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Where the unit's files are written.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Where the artifact is produced.
    #[must_use]
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// `dll/<id>/<id>.<platform library extension>`.
    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.artifact_dir
            .join(format!("{}.{}", self.id, std::env::consts::DLL_EXTENSION))
    }

    /// Remove everything from the artifact directory, keeping the directory.
    pub fn clear_artifacts(&self) -> io::Result<()> {
        empty_directory(&self.artifact_dir)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
