use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when a flag query names a flag nobody registered.
///
/// The bridge historically answered "allow" so a typo in a region config
/// could not break gameplay; that silently turns protection off. The policy
/// is an explicit operator choice now, and the safe answer is the default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFlagPolicy {
    /// Preserve gameplay on misconfiguration: unknown flags allow the action.
    Allow,
    /// Fail closed: unknown flags deny the action.
    #[default]
    Deny,
}

impl UnknownFlagPolicy {
    pub fn allows(self) -> bool {
        matches!(self, UnknownFlagPolicy::Allow)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Simple unit names that must never be auto-registered, matched
    /// case-insensitively (e.g. a default implementation shipped only as a
    /// template).
    #[serde(default)]
    pub excluded_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FlagsConfig {
    #[serde(default)]
    pub unknown_flag: UnknownFlagPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CompatConfig {
    /// Overrides the probed host version. Escape hatch for running against
    /// hosts that report versions the probe cannot parse yet.
    #[serde(default)]
    pub version_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub flags: FlagsConfig,

    #[serde(default)]
    pub compat: CompatConfig,
}

impl Settings {
    /// Loads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;

        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;

        Ok(settings)
    }
}
