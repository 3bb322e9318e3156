//! Loads compiled artifacts and runs their entry points.
//!
//! Loading maps the artifact with [`libloading`], calls its registration
//! symbol, and instantiates the first registered entry point. Libraries are
//! kept mapped for the lifetime of the [`ArtifactLoader`]; instances hold an
//! extra reference so their code stays valid even if the loader goes away.
//!
//! Every host callback is `extern "C"` and contains its own panics, so no
//! unwind ever crosses the ABI in either direction.

use std::ffi::c_void;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::time::Instant;

use libloading::{Library, Symbol};
use livecode_logging::{Caller, ConsoleLog, Severity};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::abi::{
    ABI_VERSION, EntryPoint, HookFn, HostApi, REGISTER_SYMBOL, RegisterFn, Registrar, STATUS_OK,
};
use crate::errors::ExecutionError;

/// One `register` callback received from a unit.
enum Registration {
    Compatible { entry: EntryPoint, name: String },
    Incompatible { abi_version: u32 },
}

/// Maps artifacts and instantiates their entry points.
#[derive(Default)]
pub struct ArtifactLoader {
    libraries: Mutex<Vec<Arc<Library>>>,
}

impl ArtifactLoader {
    /// Create a loader with no libraries mapped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of libraries mapped so far.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.libraries.lock().len()
    }

    /// Load `path`, resolve its first registered entry point and construct
    /// an instance.
    pub fn instantiate(&self, path: &Path) -> Result<EntryPointInstance, ExecutionError> {
        let start = Instant::now();

        // SAFETY: mapping runs the artifact's initializers. Artifacts come
        // from the console's own compile step and run with full host
        // privileges anyway.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to load artifact");
            ExecutionError::LoadFailed {
                reason: e.to_string(),
            }
        })?;
        let library = Arc::new(library);
        self.libraries.lock().push(Arc::clone(&library));

        let registrations = collect_registrations(&library, path)?;
        let (entry, name) = match registrations.into_iter().next() {
            Some(Registration::Compatible { entry, name }) => (entry, name),
            Some(Registration::Incompatible { abi_version }) => {
                return Err(ExecutionError::LoadFailed {
                    reason: format!(
                        "entry point uses ABI version {abi_version}, host expects {ABI_VERSION}"
                    ),
                });
            }
            None => return Err(ExecutionError::NoEntryPoint),
        };

        // SAFETY: `create` comes from a compatible table of a library kept
        // alive by `library`; it catches its own panics.
        let raw = unsafe { (entry.create)() };
        let Some(instance) = NonNull::new(raw) else {
            warn!(entry_point = %name, "entry point constructor returned null");
            return Err(ExecutionError::InstantiationFailed { entry_point: name });
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(path = %path.display(), entry_point = %name, duration_ms, "artifact instantiated");

        Ok(EntryPointInstance {
            entry,
            name,
            instance,
            _library: library,
        })
    }
}

impl std::fmt::Debug for ArtifactLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactLoader")
            .field("loaded", &self.loaded_count())
            .finish()
    }
}

fn collect_registrations(
    library: &Library,
    path: &Path,
) -> Result<Vec<Registration>, ExecutionError> {
    // SAFETY: the symbol type matches the export generated by the snippet
    // template.
    let register: Symbol<'_, RegisterFn> = match unsafe { library.get(REGISTER_SYMBOL) } {
        Ok(symbol) => symbol,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no registration symbol");
            return Err(ExecutionError::NoEntryPoint);
        }
    };

    let mut registrations: Vec<Registration> = Vec::new();
    let registrar = Registrar {
        abi_version: ABI_VERSION,
        ctx: ptr::from_mut(&mut registrations).cast(),
        register: host_register,
    };
    // SAFETY: `registrar` and `registrations` outlive the call; the unit only
    // uses the registrar synchronously.
    unsafe { register(&raw const registrar) };

    debug!(path = %path.display(), count = registrations.len(), "entry points registered");
    Ok(registrations)
}

/// A constructed entry point.
///
/// Dropping the instance calls the unit's `destroy`.
pub struct EntryPointInstance {
    entry: EntryPoint,
    name: String,
    instance: NonNull<c_void>,
    _library: Arc<Library>,
}

impl EntryPointInstance {
    /// Type name registered by the unit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `on_load`. Messages the entry point logs are attributed to
    /// `<name>::on_load`.
    pub fn start(&mut self, log: &ConsoleLog) -> Result<(), ExecutionError> {
        self.invoke(self.entry.on_load, "on_load", log)
    }

    /// Run `on_unload`.
    pub fn stop(&mut self, log: &ConsoleLog) -> Result<(), ExecutionError> {
        self.invoke(self.entry.on_unload, "on_unload", log)
    }

    fn invoke(
        &mut self,
        hook: HookFn,
        hook_name: &str,
        log: &ConsoleLog,
    ) -> Result<(), ExecutionError> {
        let mut ctx = InvocationContext {
            log,
            caller: format!("{}::{hook_name}", self.name),
            fault: None,
        };
        let api = HostApi {
            abi_version: ABI_VERSION,
            ctx: ptr::from_mut(&mut ctx).cast(),
            log: host_log,
            fault: host_fault,
        };

        // SAFETY: `instance` was created by this table and is destroyed only
        // on drop; `api` and `ctx` outlive the call.
        let status = unsafe { hook(self.instance.as_ptr(), &raw const api) };

        if status == STATUS_OK {
            Ok(())
        } else {
            let message = ctx
                .fault
                .take()
                .unwrap_or_else(|| format!("{hook_name} returned status {status}"));
            warn!(entry_point = %self.name, hook = hook_name, %message, "entry point raised");
            Err(ExecutionError::InvocationFailed { message })
        }
    }
}

impl Drop for EntryPointInstance {
    fn drop(&mut self) {
        // SAFETY: the instance came from `create` of the same table and is
        // dropped exactly once.
        unsafe { (self.entry.destroy)(self.instance.as_ptr()) };
    }
}

impl std::fmt::Debug for EntryPointInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPointInstance")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ── Host callbacks ──────────────────────────────────────────────────────────

/// State behind `HostApi::ctx` during one hook call.
struct InvocationContext<'a> {
    log: &'a ConsoleLog,
    caller: String,
    fault: Option<String>,
}

/// Copy `len` utf-8 bytes at `ptr`, replacing invalid sequences.
///
/// # Safety
///
/// `ptr` must be null or valid for reads of `len` bytes.
unsafe fn read_text(ptr: *const u8, len: usize) -> String {
    if ptr.is_null() || len == 0 {
        return String::new();
    }
    // SAFETY: guaranteed by the caller.
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf8_lossy(bytes).into_owned()
}

extern "C" fn host_register(ctx: *mut c_void, entry: *const EntryPoint) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: `ctx` is the registration list of `collect_registrations`,
        // alive for the duration of the registration call.
        let Some(registrations) = (unsafe { ctx.cast::<Vec<Registration>>().as_mut() }) else {
            return;
        };
        // SAFETY: the unit passes a table that lives until this call returns.
        let Some(entry) = (unsafe { entry.as_ref() }) else {
            return;
        };

        // the version field sits first in every layout revision
        if entry.abi_version != ABI_VERSION {
            registrations.push(Registration::Incompatible {
                abi_version: entry.abi_version,
            });
            return;
        }
        // SAFETY: name points at a static string inside the unit.
        let name = unsafe { read_text(entry.name_ptr, entry.name_len) };
        registrations.push(Registration::Compatible {
            entry: *entry,
            name,
        });
    }));
}

extern "C" fn host_log(ctx: *mut c_void, severity: u32, text: *const u8, len: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: `ctx` is the `InvocationContext` of the running hook call.
        let Some(ctx) = (unsafe { ctx.cast::<InvocationContext<'_>>().as_mut() }) else {
            return;
        };
        // SAFETY: the unit passes a live `&str`.
        let text = unsafe { read_text(text, len) };
        let _ = ctx.log.append(
            Caller::Named(ctx.caller.clone()),
            text,
            Severity::from_code(severity),
        );
    }));
}

extern "C" fn host_fault(ctx: *mut c_void, message: *const u8, len: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: `ctx` is the `InvocationContext` of the running hook call.
        let Some(ctx) = (unsafe { ctx.cast::<InvocationContext<'_>>().as_mut() }) else {
            return;
        };
        // SAFETY: the unit passes a live `String`.
        ctx.fault = Some(unsafe { read_text(message, len) });
    }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_file_is_load_failure() {
        let loader = ArtifactLoader::new();
        let result = loader.instantiate(Path::new("/nonexistent/livecode/tmp_x.so"));
        assert_matches!(result, Err(ExecutionError::LoadFailed { .. }));
        assert_eq!(loader.loaded_count(), 0);
    }

    #[test]
    fn garbage_file_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join(format!("garbage.{}", std::env::consts::DLL_EXTENSION));
        std::fs::write(&path, b"definitely not a shared library").unwrap();

        let result = ArtifactLoader::new().instantiate(&path);
        assert_matches!(result, Err(ExecutionError::LoadFailed { .. }));
    }

    #[test]
    fn read_text_handles_null_and_invalid_utf8() {
        assert_eq!(unsafe { read_text(ptr::null(), 4) }, "");
        let bytes = [b'o', b'k', 0xff];
        assert_eq!(unsafe { read_text(bytes.as_ptr(), bytes.len()) }, "ok\u{fffd}");
    }

    #[test]
    fn host_log_appends_with_caller() {
        let log = ConsoleLog::default();
        let mut ctx = InvocationContext {
            log: &log,
            caller: "Runner::on_load".to_string(),
            fault: None,
        };
        let text = "from the unit";
        host_log(
            ptr::from_mut(&mut ctx).cast(),
            Severity::Warning.code(),
            text.as_ptr(),
            text.len(),
        );

        let entry = log.last().unwrap();
        assert_eq!(entry.text, "from the unit");
        assert_eq!(entry.caller, "Runner::on_load");
        assert_eq!(entry.severity, Severity::Warning);
    }

    #[test]
    fn host_fault_records_message() {
        let log = ConsoleLog::default();
        let mut ctx = InvocationContext {
            log: &log,
            caller: String::new(),
            fault: None,
        };
        let message = "boom";
        host_fault(ptr::from_mut(&mut ctx).cast(), message.as_ptr(), message.len());
        assert_eq!(ctx.fault.as_deref(), Some("boom"));
        assert!(log.is_empty());
    }

    #[test]
    fn host_callbacks_ignore_null_context() {
        let text = "x";
        host_log(ptr::null_mut(), 0, text.as_ptr(), text.len());
        host_fault(ptr::null_mut(), text.as_ptr(), text.len());
        host_register(ptr::null_mut(), ptr::null());
    }
}
