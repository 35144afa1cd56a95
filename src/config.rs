//! Store configuration from file, environment, and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{MemoryError, MemoryResult, ValidationLimits};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "HMEM_DATA_DIR";

/// Data directory used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = "./memory_data";

/// Store configuration.
///
/// In TOML, `data_dir` sits at the top level and the limits under `[limits]`;
/// anything missing falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Directory holding the data file.
    pub data_dir: PathBuf,
    /// Input limits enforced on every write.
    pub limits: ValidationLimits,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: resolve_data_dir(None),
            limits: ValidationLimits::default(),
        }
    }
}

impl MemoryConfig {
    /// Config for a given directory with default limits.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            limits: ValidationLimits::default(),
        }
    }

    /// Defaults, with the data directory and limits overridden from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override limits from `HMEM_MAX_CONTENT_LENGTH`, `HMEM_MAX_TAG_LENGTH`
    /// and `HMEM_MAX_TAG_COUNT`. Unparsable values are ignored.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_usize("HMEM_MAX_CONTENT_LENGTH") {
            self.limits.max_content_length = v;
        }
        if let Some(v) = env_usize("HMEM_MAX_TAG_LENGTH") {
            self.limits.max_tag_length = v;
        }
        if let Some(v) = env_usize("HMEM_MAX_TAG_COUNT") {
            self.limits.max_tag_count = v;
        }
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {name}={raw:?}: not a non-negative integer");
            None
        }
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> MemoryResult<MemoryConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MemoryError::FileIo(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        MemoryError::InvalidContent(format!("Failed to parse config {}: {e}", path.display()))
    })
}

/// Resolve the data directory using priority order:
/// 1. Explicit path
/// 2. HMEM_DATA_DIR environment variable
/// 3. ./memory_data
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    match std::env::var(DATA_DIR_ENV) {
        Ok(env_path) if !env_path.is_empty() => PathBuf::from(env_path),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}
