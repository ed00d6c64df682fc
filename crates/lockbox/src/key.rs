//! Key provider - the single symmetric key of a store
//!
//! The key is 32 random bytes written once to `key.key` and read back on
//! every unlock. There is no rotation: losing this file makes every
//! sealed secret unrecoverable.

use anyhow::{bail, Context, Result};
use rand::RngCore;
use std::fs::{self, File, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::LockboxError;
use crate::store::create_store_dir;

/// Key length in bytes (256 bits for AES-256)
pub const KEY_LENGTH: usize = 32;

/// File name of the key inside a store directory
pub const KEY_FILE: &str = "key.key";

/// Opaque symmetric key material
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LENGTH]);

impl SymmetricKey {
    /// Generate a fresh key from the OS-seeded thread RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Build a key from raw bytes, rejecting the wrong length
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LENGTH {
            bail!(LockboxError::Persistence(format!(
                "Key must be {} bytes, got {} bytes",
                KEY_LENGTH,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

// Never print key material
impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Loads the store key, creating it on first use
pub struct KeyProvider {
    path: PathBuf,
}

impl KeyProvider {
    /// Key provider for the store directory `root`
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(KEY_FILE),
        }
    }

    /// Whether key material has been written yet
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the key, generating and persisting one if none exists
    pub fn get_key(&self) -> Result<SymmetricKey> {
        if self.exists() {
            debug!(path = %self.path.display(), "loading key");
            let bytes = fs::read(&self.path).map_err(|e| {
                LockboxError::Persistence(format!(
                    "Failed to read key {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            return SymmetricKey::from_slice(&bytes)
                .with_context(|| format!("Corrupt key file {}", self.path.display()));
        }

        let key = SymmetricKey::generate();
        self.persist(&key).map_err(|e| {
            LockboxError::Persistence(format!(
                "Failed to write key {}: {}",
                self.path.display(),
                e
            ))
        })?;
        info!(path = %self.path.display(), "generated new store key");
        Ok(key)
    }

    fn persist(&self, key: &SymmetricKey) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            create_store_dir(parent)?;
        }
        let mut file = File::create(&self.path)?;
        file.write_all(key.as_bytes())?;
        file.sync_all()?;
        fs::set_permissions(&self.path, Permissions::from_mode(0o600))
    }
}
