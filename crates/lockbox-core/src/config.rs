//! Configuration management for lockbox
//!
//! Stored as JSON in ~/.config/lockbox/config.json. Every field has a
//! default so a missing or partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store directory override (defaults to the data directory)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Ask before deleting a record in the interactive menu
    #[serde(default = "default_confirm_delete")]
    pub confirm_delete: bool,

    /// Print decrypted secrets when listing (masked otherwise)
    #[serde(default = "default_show_secrets")]
    pub show_secrets: bool,
}

fn default_confirm_delete() -> bool {
    true
}

fn default_show_secrets() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: None,
            confirm_delete: default_confirm_delete(),
            show_secrets: default_show_secrets(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the store directory: explicit override, then config, then default
    pub fn store_dir(&self, paths: &Paths, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.store_dir.clone())
            .unwrap_or_else(|| paths.store())
    }
}
