//! Records host panics in the console log.
//!
//! Panics raised inside [`contain_panics`] are skipped by the hook: whoever
//! contains them reports the failure in its own terms.

use std::any::Any;
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::ConsoleLog;
use crate::types::{Caller, Severity};

/// How long the hook waits for the log lock before giving up.
const HOOK_LOCK_TIMEOUT: Duration = Duration::from_millis(50);

thread_local! {
    /// Nesting depth of [`contain_panics`] on this thread.
    static CONTAINED: Cell<u32> = const { Cell::new(0) };
}

/// Restores the containment depth even if `catch_unwind` itself unwinds.
struct ContainGuard;

impl ContainGuard {
    fn enter() -> Self {
        CONTAINED.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for ContainGuard {
    fn drop(&mut self) {
        CONTAINED.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn is_contained() -> bool {
    CONTAINED.with(|depth| depth.get() > 0)
}

/// Run `f`, catching any panic. Panics caught here are not logged by the
/// hook installed with [`install_panic_hook`].
pub fn contain_panics<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    let _guard = ContainGuard::enter();
    catch_unwind(AssertUnwindSafe(f))
}

/// Chain a panic hook that appends an exception entry for every panic not
/// raised inside [`contain_panics`].
///
/// The previously installed hook still runs afterwards, so stderr output is
/// unchanged. If the panicking thread already holds the log lock the entry
/// is skipped instead of deadlocking.
pub fn install_panic_hook(log: Arc<ConsoleLog>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if is_contained() {
            previous(info);
            return;
        }
        let caller = info.location().map_or(Caller::Internal, |location| {
            Caller::Named(format!("{}:{}", location.file(), location.line()))
        });
        let text = format!("panic: {}", panic_message(info.payload()));
        let _ = log.try_append_for(caller, text, Severity::Exception, HOOK_LOCK_TIMEOUT);
        previous(info);
    }));
}

/// Extract the human readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_str_payload() {
        let payload = std::panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static text");
    }

    #[test]
    fn message_from_string_payload() {
        let code = 42;
        let payload = std::panic::catch_unwind(|| panic!("code {code}")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 42");
    }

    #[test]
    fn message_from_other_payload() {
        let payload = std::panic::catch_unwind(|| std::panic::panic_any(17_u32)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn contain_panics_returns_value_or_payload() {
        assert_eq!(contain_panics(|| 7).unwrap(), 7);
        let payload = contain_panics(|| panic!("inner")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "inner");
        assert!(!is_contained());
    }

    #[test]
    fn contain_panics_nests() {
        let outer = contain_panics(|| {
            let inner = contain_panics(|| panic!("nested"));
            assert!(inner.is_err());
            is_contained()
        });
        assert!(outer.unwrap());
        assert!(!is_contained());
    }

    // The hook is process-global; every hook assertion lives in this one test
    // and only looks at entries carrying its own marker text, since other
    // tests may panic concurrently.
    #[test]
    fn hook_logs_uncontained_panics_once() {
        let log = Arc::new(ConsoleLog::default());
        install_panic_hook(Arc::clone(&log));

        let uncaught = std::thread::spawn(|| panic!("hook-test uncaught")).join();
        let contained = contain_panics(|| panic!("hook-test contained"));

        drop(std::panic::take_hook());

        assert!(uncaught.is_err());
        assert!(contained.is_err());

        let ours: Vec<_> = log
            .snapshot()
            .into_iter()
            .filter(|entry| entry.text.contains("hook-test"))
            .collect();
        assert_eq!(ours.len(), 1, "{ours:?}");
        assert_eq!(ours[0].text, "panic: hook-test uncaught");
        assert_eq!(ours[0].severity, Severity::Exception);

        let (file, line) = ours[0].caller.rsplit_once(':').unwrap();
        assert_eq!(file, file!());
        assert!(line.parse::<u32>().is_ok(), "{}", ours[0].caller);
    }
}
