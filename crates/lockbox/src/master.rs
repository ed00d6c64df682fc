//! Master gate - the passphrase that unlocks a store
//!
//! Only a SHA-256 digest of the passphrase is kept, as a single hex line
//! in `master.hash`.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::LockboxError;
use crate::store::create_store_dir;

/// File name of the master hash inside a store directory
pub const MASTER_FILE: &str = "master.hash";

/// Hex digest of a passphrase
pub fn hash_passphrase(passphrase: &str) -> String {
    hex::encode(Sha256::digest(passphrase.as_bytes()))
}

/// Stored master credential
pub struct MasterGate {
    path: PathBuf,
}

impl MasterGate {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(MASTER_FILE),
        }
    }

    /// Whether a master passphrase has been set
    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    /// Set the master passphrase on first use
    pub fn setup(&self, passphrase: &str) -> Result<String> {
        if self.is_set() {
            bail!(LockboxError::AlreadyInitialized);
        }
        let hashed = self.write(passphrase)?;
        info!("master passphrase set");
        Ok(hashed)
    }

    /// Overwrite the stored passphrase hash
    pub fn replace(&self, passphrase: &str) -> Result<()> {
        if !self.is_set() {
            bail!(LockboxError::NotInitialized);
        }
        self.write(passphrase)?;
        info!("master passphrase changed");
        Ok(())
    }

    /// Compare a candidate passphrase against the stored hash
    pub fn verify(&self, passphrase: &str) -> Result<bool> {
        if !self.is_set() {
            bail!(LockboxError::NotInitialized);
        }
        let stored = fs::read_to_string(&self.path).map_err(|e| {
            LockboxError::Persistence(format!(
                "Failed to read master hash {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let matches = constant_time_eq(
            stored.trim().as_bytes(),
            hash_passphrase(passphrase).as_bytes(),
        );
        debug!(matches, "master passphrase checked");
        Ok(matches)
    }

    fn write(&self, passphrase: &str) -> Result<String> {
        if passphrase.is_empty() {
            bail!(LockboxError::EmptyPassphrase);
        }
        let hashed = hash_passphrase(passphrase);
        let persist = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                create_store_dir(parent)?;
            }
            fs::write(&self.path, &hashed)?;
            fs::set_permissions(&self.path, Permissions::from_mode(0o600))
        };
        persist().map_err(|e| {
            LockboxError::Persistence(format!(
                "Failed to write master hash {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(hashed)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind;
    use tempfile::tempdir;

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_passphrase("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_setup_then_verify() {
        let dir = tempdir().unwrap();
        let gate = MasterGate::new(dir.path());
        assert!(!gate.is_set());

        gate.setup("correct horse").unwrap();
        assert!(gate.is_set());
        assert!(gate.verify("correct horse").unwrap());
        assert!(!gate.verify("Correct horse").unwrap());
        assert!(!gate.verify("").unwrap());
    }

    #[test]
    fn test_hash_file_is_single_hex_line() {
        let dir = tempdir().unwrap();
        MasterGate::new(dir.path()).setup("pw").unwrap();

        let content = fs::read_to_string(dir.path().join(MASTER_FILE)).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert_eq!(content.len(), 64);
        assert!(content.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MASTER_FILE),
            format!("{}\n", hash_passphrase("pw")),
        )
        .unwrap();
        assert!(MasterGate::new(dir.path()).verify("pw").unwrap());
    }

    #[test]
    fn test_setup_is_once_only() {
        let dir = tempdir().unwrap();
        let gate = MasterGate::new(dir.path());
        gate.setup("first").unwrap();

        let err = gate.setup("second").unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::AlreadyInitialized)));
        assert!(gate.verify("first").unwrap());
    }

    #[test]
    fn test_replace() {
        let dir = tempdir().unwrap();
        let gate = MasterGate::new(dir.path());
        gate.setup("old").unwrap();
        gate.replace("new").unwrap();

        assert!(!gate.verify("old").unwrap());
        assert!(gate.verify("new").unwrap());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let dir = tempdir().unwrap();
        let err = MasterGate::new(dir.path()).setup("").unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::EmptyPassphrase)));
    }

    #[test]
    fn test_verify_without_setup() {
        let dir = tempdir().unwrap();
        let err = MasterGate::new(dir.path()).verify("x").unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::NotInitialized)));
    }
}
