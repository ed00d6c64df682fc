//! Standard paths used by lockbox

use std::path::{Path, PathBuf};

/// Standard lockbox paths
pub struct Paths {
    /// Data directory (~/.local/share/lockbox)
    pub data: PathBuf,
    /// Config directory (~/.config/lockbox)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("lockbox");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("lockbox");

        Self { data, config }
    }

    #[cfg(test)]
    pub(crate) fn rooted(root: &Path) -> Self {
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Path of the JSON configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }

    /// Default store directory, unless the config points elsewhere
    pub fn store(&self) -> PathBuf {
        self.data.clone()
    }
}
