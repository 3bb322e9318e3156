//! # livecode-runtime
//!
//! Snippet-to-execution pipeline of the livecode developer console.
//!
//! Operator text flows through:
//!
//! 1. [`history`]: the command line and its recall history
//! 2. [`snippet`]: wrapping into a crate-root template
//! 3. [`workspace`]: a fresh `(src/<id>, dll/<id>)` directory pair
//! 4. [`compiler`]: `rustc` producing a `cdylib`
//! 5. [`loader`]: mapping the artifact and running its registered entry point
//!
//! [`executor::Executor`] isolates steps 3–5 behind one call; [`console::Console`]
//! ties everything to a shared [`livecode_logging::ConsoleLog`].

#![deny(unsafe_code)]

pub mod abi;
pub mod compiler;
pub mod console;
pub mod errors;
pub mod executor;
pub mod history;
pub mod ids;
#[allow(unsafe_code)]
pub mod loader;
pub mod snippet;
pub mod workspace;

pub use compiler::{CompilerAdapter, ReferenceSet, Rustc, Toolchain};
pub use console::{Console, SubmissionOutcome, SubmitMode};
pub use errors::{CompileError, ExecutionError, FailureKind, WorkspaceError};
pub use executor::{Executor, NativeExecutor};
pub use history::CommandHistory;
pub use ids::RequestId;
pub use loader::{ArtifactLoader, EntryPointInstance};
pub use snippet::{CompileUnit, SnippetTemplate, SourceFile};
pub use workspace::{CompileRequest, Workspace};
