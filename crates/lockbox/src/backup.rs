//! Backup - encrypted export and import of a store directory
//!
//! The record file, key and master hash are packed into a gzip'd tar
//! and encrypted with an age passphrase (scrypt + ChaCha20-Poly1305).
//! The key travels inside the archive, so the backup passphrase is the
//! only thing protecting it.

use age::secrecy::Secret;
use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tar::{Archive, Builder};
use tracing::info;

use crate::error::LockboxError;
use crate::key::KEY_FILE;
use crate::master::MASTER_FILE;
use crate::store::{create_store_dir, RECORDS_FILE};

/// Files that make up a store, in archive order
const STORE_FILES: [&str; 3] = [MASTER_FILE, KEY_FILE, RECORDS_FILE];

/// Pack and encrypt the store directory `root` into `output`
pub fn export(root: &Path, output: &Path, passphrase: &str) -> Result<()> {
    if passphrase.is_empty() {
        bail!(LockboxError::EmptyPassphrase);
    }

    let mut tar_data = vec![];
    {
        let gz = GzEncoder::new(&mut tar_data, Compression::default());
        let mut tar_builder = Builder::new(gz);
        for name in STORE_FILES {
            let path = root.join(name);
            if path.exists() {
                tar_builder
                    .append_path_with_name(&path, name)
                    .with_context(|| format!("Failed to archive {}", path.display()))?;
            }
        }
        tar_builder.into_inner()?.finish()?;
    }

    let encryptor = age::Encryptor::with_user_passphrase(Secret::new(passphrase.to_owned()));

    let mut encrypted = vec![];
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| LockboxError::Encryption(e.to_string()))?;
    writer
        .write_all(&tar_data)
        .map_err(|e| LockboxError::Encryption(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| LockboxError::Encryption(e.to_string()))?;

    fs::write(output, encrypted).map_err(|e| {
        LockboxError::Persistence(format!("Failed to write {}: {}", output.display(), e))
    })?;

    info!(output = %output.display(), "store exported");
    Ok(())
}

/// Decrypt `input` and unpack it into the store directory `root`
pub fn import(root: &Path, input: &Path, passphrase: &str) -> Result<()> {
    let encrypted =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let decryptor = match age::Decryptor::new(&encrypted[..])
        .map_err(|e| LockboxError::Decryption(e.to_string()))?
    {
        age::Decryptor::Passphrase(d) => d,
        _ => bail!(LockboxError::Decryption(
            "Backup is not passphrase-encrypted".to_string()
        )),
    };

    let mut tar_data = vec![];
    let mut reader = decryptor
        .decrypt(&Secret::new(passphrase.to_owned()), None)
        .map_err(|e| LockboxError::Decryption(e.to_string()))?;
    reader
        .read_to_end(&mut tar_data)
        .map_err(|e| LockboxError::Decryption(e.to_string()))?;

    // Only the known store files are accepted from the archive
    let mut archive = Archive::new(GzDecoder::new(&tar_data[..]));
    let mut entries = vec![];
    for entry in archive.entries().context("Backup archive is corrupt")? {
        let mut entry = entry.context("Backup archive is corrupt")?;
        let name = entry.path()?.to_string_lossy().to_string();
        if !STORE_FILES.contains(&name.as_str()) {
            bail!(LockboxError::Decryption(format!(
                "Unexpected file in backup: {}",
                name
            )));
        }
        let mut content = vec![];
        entry.read_to_end(&mut content)?;
        entries.push((name, content));
    }

    if !entries.iter().any(|(name, _)| name == MASTER_FILE) {
        bail!(LockboxError::Decryption(
            "Backup has no master passphrase".to_string()
        ));
    }

    create_store_dir(root)
        .map_err(|e| LockboxError::Persistence(format!("{}: {}", root.display(), e)))?;
    for (name, content) in &entries {
        let path = root.join(name);
        write_private(&path, content).map_err(|e| {
            LockboxError::Persistence(format!("Failed to write {}: {}", path.display(), e))
        })?;
    }
    // A backup taken before any record existed restores to an empty store
    if !entries.iter().any(|(name, _)| name == RECORDS_FILE) {
        let stale = root.join(RECORDS_FILE);
        if stale.exists() {
            fs::remove_file(&stale)?;
        }
    }

    info!(store = %root.display(), files = entries.len(), "store imported");
    Ok(())
}

fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, content)?;
    fs::set_permissions(path, Permissions::from_mode(0o600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind;
    use crate::vault::Vault;
    use tempfile::tempdir;

    #[test]
    fn test_export_import() {
        let source = tempdir().unwrap();
        let mut vault = Vault::new(source.path());
        vault.setup("master").unwrap();
        let session = vault.unlock("master").unwrap();
        session.add("github", "alice", "s3cr3t", false).unwrap();

        let archive = source.path().join("backup.age");
        session.export(&archive, "backup pass").unwrap();

        let target = tempdir().unwrap();
        let mut restored = Vault::new(target.path());
        restored.import(&archive, "backup pass", false).unwrap();

        let session = restored.unlock("master").unwrap();
        let cred = session.get("github").unwrap();
        assert_eq!(cred.secret.as_deref().unwrap(), "s3cr3t");

        // Wrong passphrase is a decryption error
        let other = tempdir().unwrap();
        let err = import(other.path(), &archive, "nope").unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::Decryption(_))));

        // An initialized store is not overwritten without force
        let err = restored.import(&archive, "backup pass", false).unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::AlreadyInitialized)));
    }

    #[test]
    fn test_export_requires_passphrase() {
        let dir = tempdir().unwrap();
        let err = export(dir.path(), &dir.path().join("out.age"), "").unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::EmptyPassphrase)));
    }
}
