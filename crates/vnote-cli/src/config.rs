use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vnote_merge::MergeStrategy;

pub const CONFIG_FILE: &str = "vnote.toml";
pub const HOME_ENV: &str = "VNOTE_HOME";

/// Settings read from `vnote.toml` in the data directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Stamped into exported snapshots.
    pub device_id: Option<String>,
    pub default_strategy: MergeStrategy,
    /// Pretty-print exported JSON.
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            default_strategy: MergeStrategy::MergeCombine,
            pretty: true,
        }
    }
}

impl CliConfig {
    /// Load `vnote.toml` from `data_dir`. A missing file yields the defaults.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Pick the data directory: the flag, then `$VNOTE_HOME`, then `./.vnote`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(HOME_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".vnote"))
}
