//! # livecode-settings
//!
//! Configuration for the livecode developer console.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LivecodeSettings::default()`]
//! 2. **User file**: `~/.livecode/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `LIVECODE_*` overrides (highest priority)
//!
//! There is no global instance. The host loads settings once at startup and
//! hands the relevant sections to the console, the log and the toolchain.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path,
    save_settings_to_path, settings_path,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = LivecodeSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = LivecodeSettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.console.max_history_length, 1024);
        assert_eq!(
            settings.console.format_string,
            "[{{type}}] {{caller}}: {{message}}"
        );
        assert!(settings.console.show_on_error);
        assert!(!settings.console.show_on_message);
        assert!(!settings.console.show_on_warning);
        assert!(settings.console.auto_scroll_to_bottom);
        assert!(settings.workspace.path.is_none());
        assert!(settings.toolchain.rustc.is_none());
        assert_eq!(settings.toolchain.opt_level, 0);
        assert!(!settings.toolchain.prelude.is_empty());
        assert_eq!(settings.logging.level, "warn");
    }
}
