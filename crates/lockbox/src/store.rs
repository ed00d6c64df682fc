//! Record store - the whole-file snapshot of account records
//!
//! `passwords.json` maps account name to username and sealed password.
//! Every operation reads the full file and every mutation rewrites it.
//! There is no locking: two processes on one store can lose writes.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, Permissions};
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::LockboxError;

/// File name of the record file inside a store directory
pub const RECORDS_FILE: &str = "passwords.json";

/// Create a missing store directory, readable only by its owner.
/// An existing directory keeps its permissions.
pub(crate) fn create_store_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    fs::set_permissions(dir, Permissions::from_mode(0o700))
}

/// One stored credential; the secret stays sealed on disk and in memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Username or email, stored in plaintext
    pub username: String,
    /// Sealed secret (see `cipher::seal`)
    #[serde(rename = "password")]
    pub secret: String,
    /// Last write time; absent in files written by older tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(username: &str, secret: String) -> Self {
        Self {
            username: username.to_string(),
            secret,
            updated: Some(Utc::now()),
        }
    }
}

/// Account name -> record, kept sorted by account
pub type Store = BTreeMap<String, Record>;

/// Reads and writes the record file of one store directory
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(RECORDS_FILE),
        }
    }

    /// Load every record. A missing, unreadable or unparsable file is an empty store.
    pub fn load(&self) -> Store {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Store::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "record file unreadable, treating as empty");
                return Store::new();
            }
        };

        if content.trim().is_empty() {
            return Store::new();
        }

        match serde_json::from_str::<Store>(&content) {
            Ok(store) => {
                debug!(records = store.len(), "loaded records");
                store
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "record file unparsable, treating as empty");
                Store::new()
            }
        }
    }

    /// Overwrite the record file with the full store
    pub fn save(&self, store: &Store) -> Result<()> {
        let content = serde_json::to_string_pretty(store)
            .map_err(|e| LockboxError::Persistence(format!("Failed to serialize records: {}", e)))?;

        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                create_store_dir(parent)?;
            }
            fs::write(&self.path, &content)?;
            fs::set_permissions(&self.path, Permissions::from_mode(0o600))
        };
        write().map_err(|e| {
            LockboxError::Persistence(format!(
                "Failed to write records {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(records = store.len(), "saved records");
        Ok(())
    }
}
