//! Engine configuration, read from `config.toml` in the data directory.
//!
//! ```toml
//! [engagement]
//! default_vitality_ceiling = 100
//!
//! [scanner]
//! suffix_variants = true
//! gloss_max_chars = 40
//!
//! [queue]
//! due_batch_size = 10
//! ```
//!
//! Every key is optional. A missing file means all defaults.

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use ame_core::ScanOptions;
use ame_core::constants::{DEFAULT_VITALITY_CEILING, GLOSS_MAX_CHARS};

use crate::error::{Result, StoreError};

pub const DATA_DIR_ENV: &str = "AME_DATA_DIR";
pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_FILE: &str = "progress.db";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub engagement: EngagementConfig,
    pub scanner: ScannerConfig,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Ceiling given to a learner seen for the first time.
    pub default_vitality_ceiling: i64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            default_vitality_ceiling: DEFAULT_VITALITY_CEILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub suffix_variants: bool,
    pub gloss_max_chars: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            suffix_variants: true,
            gloss_max_chars: GLOSS_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub due_batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { due_batch_size: 10 }
    }
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| match e {
                StoreError::Config(msg) => {
                    StoreError::Config(format!("{}: {msg}", path.display()))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.engagement.default_vitality_ceiling < 1 {
            return Err(StoreError::Config(
                "engagement.default_vitality_ceiling must be at least 1".to_string(),
            ));
        }
        if self.queue.due_batch_size == 0 {
            return Err(StoreError::Config(
                "queue.due_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            suffix_variants: self.scanner.suffix_variants,
            gloss_max_chars: self.scanner.gloss_max_chars,
        }
    }
}

/// Data directory: explicit argument, then `AME_DATA_DIR`, then
/// `~/.adaptive-mastery`.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    resolve_data_dir(explicit, env::var(DATA_DIR_ENV).ok())
}

fn resolve_data_dir(explicit: Option<&Path>, env_value: Option<String>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match env_value {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v),
        _ => dirs_home().join(".adaptive-mastery"),
    }
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
