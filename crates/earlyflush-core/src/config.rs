//! Quest configuration.
//!
//! A `QuestConfig` is built once at startup (defaults, then an optional
//! TOML file, then CLI flags) and passed by value into every handler.
//! Requests may derive a new value via [`QuestOverrides`]; the process-wide
//! value itself never changes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DUNGEON_DELAY_MS: u64 = 2000;
pub const DEFAULT_ARMOR_DOWNLOAD_MS: u64 = 800;

/// Ceiling for per-request overrides. A request cannot hold a stream task
/// open for longer than this.
pub const MAX_OVERRIDE_MS: u64 = 60_000;

/// Timing knobs for one page render.
///
/// `dungeon_delay_ms` is the simulated backend latency the streamer waits
/// between the head and body chunks. `armor_download_ms` is advisory: it
/// only shows up in rendered text and never drives a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestConfig {
    #[serde(alias = "dungeon_delay_ms")]
    pub dungeon_delay_ms: u64,
    #[serde(alias = "armor_download_ms")]
    pub armor_download_ms: u64,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            dungeon_delay_ms: DEFAULT_DUNGEON_DELAY_MS,
            armor_download_ms: DEFAULT_ARMOR_DOWNLOAD_MS,
        }
    }
}

impl QuestConfig {
    pub fn new(dungeon_delay_ms: u64, armor_download_ms: u64) -> Self {
        Self {
            dungeon_delay_ms,
            armor_download_ms,
        }
    }

    pub fn dungeon_delay(&self) -> Duration {
        Duration::from_millis(self.dungeon_delay_ms)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Return a copy with any present override applied.
    pub fn with_overrides(self, overrides: &QuestOverrides) -> Self {
        Self {
            dungeon_delay_ms: overrides.dungeon_delay_ms.unwrap_or(self.dungeon_delay_ms),
            armor_download_ms: overrides.armor_download_ms.unwrap_or(self.armor_download_ms),
        }
    }
}

/// Per-request overrides, typically parsed from a query string.
///
/// A blank value (`?dungeon_delay_ms=`, as sent by a cleared form field)
/// counts as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestOverrides {
    #[serde(
        default,
        alias = "dungeonDelayMs",
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub dungeon_delay_ms: Option<u64>,
    #[serde(
        default,
        alias = "armorDownloadMs",
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub armor_download_ms: Option<u64>,
}

impl QuestOverrides {
    pub fn is_empty(&self) -> bool {
        self.dungeon_delay_ms.is_none() && self.armor_download_ms.is_none()
    }

    /// Cap every present value at [`MAX_OVERRIDE_MS`].
    pub fn clamped(self) -> Self {
        Self {
            dungeon_delay_ms: self.dungeon_delay_ms.map(|ms| ms.min(MAX_OVERRIDE_MS)),
            armor_download_ms: self.armor_download_ms.map(|ms| ms.min(MAX_OVERRIDE_MS)),
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
