//! # livecode-logging
//!
//! Console log for the livecode developer console.
//!
//! This crate provides:
//! - [`ConsoleLog`], a bounded, thread-safe scrollback with consecutive
//!   de-duplication and reveal/scroll signals for a view
//! - [`ConsoleLayer`], a [`tracing_subscriber::Layer`] that forwards
//!   application `tracing` events into the log
//! - [`install_panic_hook`] to record host panics as exception entries
//! - [`format_message`] to render entries through a line template
//! - [`init_subscriber`] / [`init_subscriber_with_console`] for process setup

#![deny(unsafe_code)]

pub mod buffer;
pub mod format;
pub mod layer;
pub mod panic_hook;
pub mod types;

use std::sync::Arc;

pub use buffer::{AppendOutcome, ConsoleLog, LogPolicy};
pub use format::format_message;
pub use layer::ConsoleLayer;
pub use panic_hook::{contain_panics, install_panic_hook, panic_message};
pub use types::{Caller, LogMessage, Severity};

/// Initialize the global tracing subscriber with stderr output only.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence over `level`.
pub fn init_subscriber(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(stderr_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// `RUST_LOG` if set and valid, else `level`.
fn stderr_filter(level: &str) -> tracing_subscriber::EnvFilter {
    use tracing_subscriber::EnvFilter;

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber with stderr output AND console
/// forwarding.
///
/// The stderr layer honours `level` (or `RUST_LOG`); the [`ConsoleLayer`]
/// applies its own `INFO` threshold independently so application events
/// reach the console even when stderr is quiet.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_subscriber_with_console(level: &str, log: Arc<ConsoleLog>) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(stderr_filter(level));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(ConsoleLayer::new(log))
        .try_init()
        .is_ok()
}
