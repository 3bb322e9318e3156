//! Compile request identifiers.

use std::fmt;

use uuid::Uuid;

/// Name of a compile request directory pair.
///
/// `tmp_` followed by a UUID v7 in simple form, so ids are valid file names,
/// valid crate-adjacent identifiers and sort by creation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(String);

impl RequestId {
    /// Prefix of every request id.
    pub const PREFIX: &'static str = "tmp_";

    /// Generate a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Uuid::now_v7().simple()))
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
