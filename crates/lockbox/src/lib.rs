//! lockbox - Local password manager
//!
//! Account credentials (account, username, secret) are kept in a single
//! record file with every secret sealed by AES-256-GCM. A master
//! passphrase gates access: three wrong attempts and the session ends
//! before any record is touched.
//!
//! Layout of a store directory:
//! - `key.key` - 32-byte symmetric key, created on first unlock
//! - `master.hash` - SHA-256 of the master passphrase, hex
//! - `passwords.json` - account -> {username, sealed password}

pub mod backup;
pub mod cipher;
pub mod error;
pub mod key;
pub mod master;
pub mod menu;
pub mod prompt;
pub mod store;
pub mod vault;

pub use error::LockboxError;
pub use key::{KeyProvider, SymmetricKey};
pub use master::MasterGate;
pub use store::{Record, RecordStore, Store};
pub use vault::{AddOutcome, Credential, UnlockedVault, Vault, MAX_ATTEMPTS};
