//! Settings loading: compiled defaults, then the user file, then the
//! environment.
//!
//! The user file is merged over the defaults as JSON before it is
//! deserialized, so a file only needs the keys it changes. Objects merge
//! key by key, arrays and scalars replace, and `null` keeps the default.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::LivecodeSettings;

/// Directory under `$HOME` holding the settings file.
const SETTINGS_DIR: &str = ".livecode";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Accepted range for `LIVECODE_MAX_HISTORY`.
const MAX_HISTORY_RANGE: (usize, usize) = (1, 1_000_000);

/// `~/.livecode/settings.json`, or under the temp dir when `$HOME` is unset.
pub fn settings_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(std::env::temp_dir, PathBuf::from)
        .join(SETTINGS_DIR)
        .join(SETTINGS_FILE)
}

/// Load from [`settings_path`].
pub fn load_settings() -> Result<LivecodeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load from `path`, falling back to defaults when it does not exist.
///
/// Environment overrides are applied last, then the result is validated.
pub fn load_settings_from_path(path: &Path) -> Result<LivecodeSettings> {
    let mut merged = serde_json::to_value(LivecodeSettings::default())?;
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), "merging settings file");
            merge_into(&mut merged, serde_json::from_str(&content)?);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
        }
        Err(e) => return Err(SettingsError::io(path)(e)),
    }

    let mut settings: LivecodeSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Write `settings` as pretty JSON, creating parent directories.
pub fn save_settings_to_path(settings: &LivecodeSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(SettingsError::io(parent))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).map_err(SettingsError::io(path))?;
    debug!(path = %path.display(), "settings saved");
    Ok(())
}

fn validate(settings: &LivecodeSettings) -> Result<()> {
    if settings.console.max_history_length == 0 {
        return Err(SettingsError::InvalidValue(
            "console.maxHistoryLength must be at least 1".to_string(),
        ));
    }
    if settings.toolchain.opt_level > 3 {
        return Err(SettingsError::InvalidValue(format!(
            "toolchain.optLevel must be 0-3, got {}",
            settings.toolchain.opt_level
        )));
    }
    Ok(())
}

/// Merge `overlay` over `base` and return the result.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None if !value.is_null() => {
                        let _ = base.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply `LIVECODE_*` environment overrides.
///
/// Unparseable values are logged and ignored.
pub fn apply_env_overrides(settings: &mut LivecodeSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut LivecodeSettings, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

    if let Some(path) = lookup("LIVECODE_WORKSPACE") {
        settings.workspace.path = Some(path);
    }
    if let Some(program) = lookup("LIVECODE_RUSTC") {
        settings.toolchain.rustc = Some(program);
    }
    if let Some(raw) = lookup("LIVECODE_MAX_HISTORY") {
        let (min, max) = MAX_HISTORY_RANGE;
        match parse_usize_range(&raw, min, max) {
            Some(n) => settings.console.max_history_length = n,
            None => warn!(key = "LIVECODE_MAX_HISTORY", value = %raw, min, max, "ignoring out-of-range override"),
        }
    }
    if let Some(raw) = lookup("LIVECODE_SHOW_ON_ERROR") {
        match parse_bool(&raw) {
            Some(show) => settings.console.show_on_error = show,
            None => warn!(key = "LIVECODE_SHOW_ON_ERROR", value = %raw, "ignoring non-boolean override"),
        }
    }
    if let Some(level) = lookup("LIVECODE_LOG_LEVEL") {
        settings.logging.level = level;
    }
}

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];

    let val = val.trim();
    if TRUE.iter().any(|t| val.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| val.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// `val` as a `usize` in `min..=max`.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    val.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (min..=max).contains(n))
}
