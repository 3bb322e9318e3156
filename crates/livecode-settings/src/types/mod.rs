//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format and `#[serde(default)]` so partial files are accepted: missing
//! fields get their compiled default during deserialization.

mod console;
mod toolchain;

pub use console::*;
pub use toolchain::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the console.
///
/// # JSON Format
///
/// ```json
/// {
///   "console": { "maxHistoryLength": 256, "showOnWarning": true },
///   "toolchain": { "optLevel": 1 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivecodeSettings {
    /// Settings schema version.
    pub version: String,
    /// Scrollback log and command line behavior.
    pub console: ConsoleSettings,
    /// Scratch workspace location.
    pub workspace: WorkspaceSettings,
    /// Compiler invocation and snippet prelude.
    pub toolchain: ToolchainSettings,
    /// Stderr diagnostics for the console itself.
    pub logging: LoggingSettings,
}

impl Default for LivecodeSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            console: ConsoleSettings::default(),
            workspace: WorkspaceSettings::default(),
            toolchain: ToolchainSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Scratch workspace location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceSettings {
    /// Root of the scratch tree. Defaults to `<temp>/livecode` when unset.
    ///
    /// The directory is wiped on every console start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Stderr subscriber settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serde_roundtrip() {
        let defaults = LivecodeSettings::default();
        let json = serde_json::to_string(&defaults).unwrap();
        let back: LivecodeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, defaults);
    }

    #[test]
    fn default_settings_json_field_names() {
        let json = serde_json::to_value(LivecodeSettings::default()).unwrap();

        let console = json.get("console").unwrap();
        assert!(console.get("maxHistoryLength").is_some());
        assert!(console.get("formatString").is_some());
        assert!(console.get("showOnError").is_some());

        let toolchain = json.get("toolchain").unwrap();
        assert!(toolchain.get("optLevel").is_some());
        assert!(toolchain.get("libraryPaths").is_some());

        // Optional values omitted when None
        assert!(json["workspace"].get("path").is_none());
        assert!(toolchain.get("rustc").is_none());
    }

    #[test]
    fn empty_json_produces_defaults() {
        let settings: LivecodeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.console.max_history_length, 1024);
        assert_eq!(settings.logging.level, "warn");
    }
}
