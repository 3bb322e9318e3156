//! Bounded scrollback log shared by every writer in the process.
//!
//! Writers may be the console itself, a compiled snippet calling back through
//! the host table, the tracing bridge, or the panic hook, each on any thread.
//! All mutable state lives under a single mutex; the view-facing signals are
//! atomics so a renderer can poll them without contending for the buffer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use livecode_settings::ConsoleSettings;
use parking_lot::{Mutex, MutexGuard};

use crate::types::{Caller, LogMessage, Severity, capture_trace};

/// Retention and reveal behavior of a [`ConsoleLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogPolicy {
    /// Entries kept before the oldest is evicted.
    pub max_entries: usize,
    /// Reveal the view on informational messages.
    pub reveal_on_info: bool,
    /// Reveal the view on warnings.
    pub reveal_on_warning: bool,
    /// Reveal the view on errors and exceptions.
    pub reveal_on_error: bool,
    /// Request a scroll to the newest entry on every new entry.
    pub auto_scroll: bool,
}

impl LogPolicy {
    /// Whether a new entry of `severity` should reveal the view.
    #[must_use]
    pub fn reveals(&self, severity: Severity) -> bool {
        if severity.is_failure() {
            self.reveal_on_error
        } else if severity == Severity::Warning {
            self.reveal_on_warning
        } else {
            self.reveal_on_info
        }
    }
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self::from(&ConsoleSettings::default())
    }
}

impl From<&ConsoleSettings> for LogPolicy {
    fn from(settings: &ConsoleSettings) -> Self {
        Self {
            max_entries: settings.max_history_length.max(1),
            reveal_on_info: settings.show_on_message,
            reveal_on_warning: settings.show_on_warning,
            reveal_on_error: settings.show_on_error,
            auto_scroll: settings.auto_scroll_to_bottom,
        }
    }
}

/// What [`ConsoleLog::append`] did with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new entry was created.
    Added {
        /// Id of the new entry.
        id: u64,
    },
    /// The message matched the newest entry and bumped its counter.
    Repeated {
        /// Id of the existing entry.
        id: u64,
        /// Counter after the bump.
        count: u64,
    },
}

impl AppendOutcome {
    /// Id of the entry that now carries the message.
    #[must_use]
    pub const fn id(self) -> u64 {
        match self {
            Self::Added { id } | Self::Repeated { id, .. } => id,
        }
    }
}

/// Message prepared outside the lock. The trace is only captured once the
/// message is known not to repeat the newest entry.
struct Pending {
    caller: Caller,
    text: String,
    severity: Severity,
}

impl Pending {
    fn new(caller: Caller, text: String, severity: Severity) -> Self {
        Self {
            caller,
            text,
            severity,
        }
    }
}

struct LogState {
    entries: VecDeque<LogMessage>,
    policy: LogPolicy,
    next_id: u64,
}

impl LogState {
    fn insert(&mut self, pending: Pending) -> AppendOutcome {
        if let Some(last) = self.entries.back_mut() {
            if last.is_repeat_of(&pending.text, pending.severity) {
                last.count += 1;
                return AppendOutcome::Repeated {
                    id: last.id,
                    count: last.count,
                };
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(LogMessage {
            id,
            caller: pending.caller.label(),
            trace: capture_trace(&pending.caller),
            text: pending.text,
            severity: pending.severity,
            count: 1,
            timestamp: Utc::now(),
        });
        self.evict();
        AppendOutcome::Added { id }
    }

    fn evict(&mut self) {
        while self.entries.len() > self.policy.max_entries {
            let _ = self.entries.pop_front();
        }
    }
}

/// Thread-safe scrollback log with consecutive de-duplication.
pub struct ConsoleLog {
    state: Mutex<LogState>,
    reveal_requested: AtomicBool,
    scroll_requested: AtomicBool,
    revision: AtomicU64,
}

impl ConsoleLog {
    /// Create an empty log.
    #[must_use]
    pub fn new(policy: LogPolicy) -> Self {
        Self {
            state: Mutex::new(LogState {
                entries: VecDeque::new(),
                policy,
                next_id: 1,
            }),
            reveal_requested: AtomicBool::new(false),
            scroll_requested: AtomicBool::new(false),
            revision: AtomicU64::new(0),
        }
    }

    /// Append a message.
    ///
    /// If `(text, severity)` equals the newest entry, its counter is bumped
    /// and no new entry is created. Otherwise a new entry is pushed and the
    /// oldest entries are evicted until the log fits its capacity.
    pub fn append(
        &self,
        caller: impl Into<Caller>,
        text: impl Into<String>,
        severity: Severity,
    ) -> AppendOutcome {
        let pending = Pending::new(caller.into(), text.into(), severity);
        let state = self.state.lock();
        self.commit(state, pending)
    }

    /// Like [`append`](Self::append) but gives up after `timeout` if the
    /// log is locked. Used from the panic hook, where the panicking thread
    /// may already hold the lock.
    pub fn try_append_for(
        &self,
        caller: impl Into<Caller>,
        text: impl Into<String>,
        severity: Severity,
        timeout: Duration,
    ) -> Option<AppendOutcome> {
        let pending = Pending::new(caller.into(), text.into(), severity);
        let state = self.state.try_lock_for(timeout)?;
        Some(self.commit(state, pending))
    }

    fn commit(&self, mut state: MutexGuard<'_, LogState>, pending: Pending) -> AppendOutcome {
        let severity = pending.severity;
        let outcome = state.insert(pending);
        let reveal = state.policy.reveals(severity);
        let scroll = state.policy.auto_scroll;
        drop(state);

        let _ = self.revision.fetch_add(1, Ordering::AcqRel);
        if matches!(outcome, AppendOutcome::Added { .. }) {
            if reveal {
                self.reveal_requested.store(true, Ordering::Release);
            }
            if scroll {
                self.scroll_requested.store(true, Ordering::Release);
            }
        }
        outcome
    }

    /// Append an informational message attributed to the calling location.
    #[track_caller]
    pub fn message(&self, text: impl Into<String>) -> AppendOutcome {
        self.append(Caller::here(), text, Severity::Info)
    }

    /// Append a warning attributed to the calling location.
    #[track_caller]
    pub fn warning(&self, text: impl Into<String>) -> AppendOutcome {
        self.append(Caller::here(), text, Severity::Warning)
    }

    /// Append an error attributed to the calling location.
    #[track_caller]
    pub fn error(&self, text: impl Into<String>) -> AppendOutcome {
        self.append(Caller::here(), text, Severity::Error)
    }

    /// Append an exception attributed to the calling location.
    #[track_caller]
    pub fn exception(&self, text: impl Into<String>) -> AppendOutcome {
        self.append(Caller::here(), text, Severity::Exception)
    }

    /// Append a message from the console machinery.
    pub fn internal(&self, text: impl Into<String>, severity: Severity) -> AppendOutcome {
        self.append(Caller::Internal, text, severity)
    }

    /// Copy of the current entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogMessage> {
        self.state.lock().entries.iter().cloned().collect()
    }

    /// Entries with an id greater than `after`, oldest first.
    #[must_use]
    pub fn entries_since(&self, after: u64) -> Vec<LogMessage> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.id > after)
            .cloned()
            .collect()
    }

    /// Newest entry, if any.
    #[must_use]
    pub fn last(&self) -> Option<LogMessage> {
        self.state.lock().entries.back().cloned()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Remove every entry. Ids keep increasing afterwards.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
        let _ = self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Current policy.
    #[must_use]
    pub fn policy(&self) -> LogPolicy {
        self.state.lock().policy.clone()
    }

    /// Replace the policy. A smaller capacity evicts immediately.
    pub fn set_policy(&self, policy: LogPolicy) {
        let mut state = self.state.lock();
        state.policy = LogPolicy {
            max_entries: policy.max_entries.max(1),
            ..policy
        };
        state.evict();
        drop(state);
        let _ = self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Consume a pending reveal request.
    pub fn take_reveal_request(&self) -> bool {
        self.reveal_requested.swap(false, Ordering::AcqRel)
    }

    /// Consume a pending scroll-to-bottom request.
    pub fn take_scroll_request(&self) -> bool {
        self.scroll_requested.swap(false, Ordering::AcqRel)
    }

    /// Counter bumped on every mutation; lets a view skip redraws.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new(LogPolicy::default())
    }
}

impl std::fmt::Debug for ConsoleLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConsoleLog")
            .field("entries", &state.entries.len())
            .field("policy", &state.policy)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
