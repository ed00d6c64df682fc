//! Vault - locked and unlocked views of a credential store
//!
//! A `Vault` is locked: it can set up the master passphrase, restore a
//! backup, and try to unlock. Only a successful `unlock` yields an
//! `UnlockedVault`, which carries the key and is the only type offering
//! record operations. Three failed attempts exhaust the vault for the
//! rest of the process.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::backup;
use crate::cipher;
use crate::error::LockboxError;
use crate::key::{KeyProvider, SymmetricKey};
use crate::master::MasterGate;
use crate::store::{Record, RecordStore};

/// Master passphrase attempts allowed per process
pub const MAX_ATTEMPTS: u32 = 3;

/// A locked store
pub struct Vault {
    root: PathBuf,
    gate: MasterGate,
    attempts_left: u32,
}

impl Vault {
    /// Open (but do not unlock) the store in `root`
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            gate: MasterGate::new(root),
            attempts_left: MAX_ATTEMPTS,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a master passphrase has been set
    pub fn is_initialized(&self) -> bool {
        self.gate.is_set()
    }

    /// Set the master passphrase for a new store
    pub fn setup(&self, passphrase: &str) -> Result<()> {
        self.gate.setup(passphrase)?;
        Ok(())
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_left
    }

    /// Verify the master passphrase and load the key
    pub fn unlock(&mut self, passphrase: &str) -> Result<UnlockedVault> {
        if self.attempts_left == 0 {
            bail!(LockboxError::AttemptsExhausted);
        }

        if !self.gate.verify(passphrase)? {
            self.attempts_left -= 1;
            warn!(remaining = self.attempts_left, "master passphrase rejected");
            if self.attempts_left == 0 {
                bail!(LockboxError::AttemptsExhausted);
            }
            bail!(LockboxError::Authentication);
        }

        let key = KeyProvider::new(&self.root).get_key()?;
        info!(store = %self.root.display(), "store unlocked");

        Ok(UnlockedVault {
            root: self.root.clone(),
            key,
            records: RecordStore::new(&self.root),
        })
    }

    /// Restore a backup into this store; an initialized store needs `force`
    pub fn import(&self, archive: &Path, passphrase: &str, force: bool) -> Result<()> {
        if self.is_initialized() && !force {
            bail!(LockboxError::AlreadyInitialized);
        }
        backup::import(&self.root, archive, passphrase)
    }
}

/// Result of an `add`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Replaced,
}

/// A record with its secret opened
#[derive(Debug)]
pub struct Credential {
    pub account: String,
    pub username: String,
    pub updated: Option<DateTime<Utc>>,
    /// The plaintext, or why this one record could not be opened
    pub secret: std::result::Result<String, LockboxError>,
}

/// An unlocked store session
pub struct UnlockedVault {
    root: PathBuf,
    key: SymmetricKey,
    records: RecordStore,
}

impl UnlockedVault {
    /// Check if an account is stored
    pub fn exists(&self, account: &str) -> bool {
        self.records.load().contains_key(account.trim())
    }

    /// Store a credential, replacing an existing one only when `overwrite` is set
    pub fn add(
        &self,
        account: &str,
        username: &str,
        secret: &str,
        overwrite: bool,
    ) -> Result<AddOutcome> {
        let account = validate_account(account)?;
        let mut store = self.records.load();

        let outcome = if store.contains_key(account) {
            if !overwrite {
                bail!(LockboxError::AccountExists(account.to_string()));
            }
            AddOutcome::Replaced
        } else {
            AddOutcome::Inserted
        };

        let sealed = cipher::seal(secret, &self.key)?;
        store.insert(account.to_string(), Record::new(username.trim(), sealed));
        self.records.save(&store)?;

        info!(account, ?outcome, "record saved");
        Ok(outcome)
    }

    /// Every record, secrets opened; a record that fails to open carries its error
    pub fn view_all(&self) -> Vec<Credential> {
        self.records
            .load()
            .into_iter()
            .map(|(account, record)| self.reveal(account, record))
            .collect()
    }

    /// Records whose account contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<Credential> {
        let needle = term.to_lowercase();
        self.records
            .load()
            .into_iter()
            .filter(|(account, _)| account.to_lowercase().contains(&needle))
            .map(|(account, record)| self.reveal(account, record))
            .collect()
    }

    /// One record by exact account name
    pub fn get(&self, account: &str) -> Result<Credential> {
        let account = account.trim();
        match self.records.load().remove(account) {
            Some(record) => Ok(self.reveal(account.to_string(), record)),
            None => bail!(LockboxError::NotFound(account.to_string())),
        }
    }

    /// Stored account names, sorted
    pub fn accounts(&self) -> Vec<String> {
        self.records.load().into_keys().collect()
    }

    /// Remove a record; the store is left untouched when it is absent
    pub fn delete(&self, account: &str) -> Result<()> {
        let account = account.trim();
        let mut store = self.records.load();

        if store.remove(account).is_none() {
            bail!(LockboxError::NotFound(account.to_string()));
        }

        self.records.save(&store)?;
        info!(account, "record deleted");
        Ok(())
    }

    /// Replace the master passphrase
    pub fn change_master(&self, passphrase: &str) -> Result<()> {
        MasterGate::new(&self.root).replace(passphrase)
    }

    /// Write an encrypted backup of the whole store directory
    pub fn export(&self, output: &Path, passphrase: &str) -> Result<()> {
        backup::export(&self.root, output, passphrase)
    }

    fn reveal(&self, account: String, record: Record) -> Credential {
        let secret = cipher::open(&record.secret, &self.key);
        if let Err(ref e) = secret {
            warn!(account = %account, error = %e, "record could not be opened");
        }
        Credential {
            account,
            username: record.username,
            updated: record.updated,
            secret,
        }
    }
}

/// Trim an account name and reject empty or control-character names
fn validate_account(account: &str) -> Result<&str> {
    let trimmed = account.trim();
    if trimmed.is_empty() {
        bail!(LockboxError::InvalidAccount(
            "Account cannot be empty".to_string()
        ));
    }
    if let Some(c) = trimmed.chars().find(|c| c.is_control()) {
        bail!(LockboxError::InvalidAccount(format!(
            "Invalid character {:?} in account",
            c
        )));
    }
    Ok(trimmed)
}
