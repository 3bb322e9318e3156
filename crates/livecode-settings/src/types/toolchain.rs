//! Compiler invocation settings.

use serde::{Deserialize, Serialize};

/// How snippets are compiled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolchainSettings {
    /// Explicit compiler program. Discovered from the environment when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rustc: Option<String>,
    /// `-C opt-level` passed to the compiler.
    pub opt_level: u8,
    /// Extra arguments appended verbatim before the crate root.
    pub extra_args: Vec<String>,
    /// Libraries every snippet links against (`--extern name=path`).
    pub references: Vec<ReferenceSettings>,
    /// Library search paths (`-L`).
    pub library_paths: Vec<String>,
    /// `use` lines placed above every wrapped snippet.
    pub prelude: Vec<String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            rustc: None,
            opt_level: 0,
            extra_args: Vec::new(),
            references: Vec::new(),
            library_paths: Vec::new(),
            prelude: default_prelude(),
        }
    }
}

/// One `--extern` reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSettings {
    /// Crate name as seen from the snippet.
    pub name: String,
    /// Path to the compiled `rlib`/`dylib`.
    pub path: String,
}

/// Imports available to every snippet without typing them.
pub fn default_prelude() -> Vec<String> {
    [
        "use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};",
        "use std::fmt::Write as _;",
        "use std::sync::{Arc, Mutex};",
        "use std::time::{Duration, Instant};",
    ]
    .iter()
    .map(|line| (*line).to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_parse_from_json() {
        let settings: ToolchainSettings = serde_json::from_str(
            r#"{"references": [{"name": "host_api", "path": "/opt/host/libhost_api.rlib"}]}"#,
        )
        .unwrap();
        assert_eq!(settings.references.len(), 1);
        assert_eq!(settings.references[0].name, "host_api");
        assert_eq!(settings.prelude, default_prelude());
    }

    #[test]
    fn prelude_lines_are_use_declarations() {
        for line in default_prelude() {
            assert!(line.starts_with("use "), "{line}");
            assert!(line.ends_with(';'), "{line}");
        }
    }
}
