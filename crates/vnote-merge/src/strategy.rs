use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-key conflict resolution policy for an import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Overwrite an existing record with the incoming one.
    Replace,
    /// Take the incoming record only if its note is strictly newer.
    MergeNewer,
    /// Keep the newer note and append unseen research entries.
    #[default]
    MergeCombine,
    /// Leave existing records untouched.
    SkipExisting,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 4] = [
        Self::Replace,
        Self::MergeNewer,
        Self::MergeCombine,
        Self::SkipExisting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::MergeNewer => "merge_newer",
            Self::MergeCombine => "merge_combine",
            Self::SkipExisting => "skip_existing",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a strategy name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown merge strategy {0:?} (expected replace, merge_newer, merge_combine or skip_existing)")]
pub struct UnknownStrategy(pub String);

impl FromStr for MergeStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
