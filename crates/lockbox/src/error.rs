//! Error taxonomy for the credential store

use thiserror::Error;

/// Lockbox-specific errors
#[derive(Error, Debug)]
pub enum LockboxError {
    #[error("Incorrect master passphrase")]
    Authentication,

    #[error("Too many failed attempts")]
    AttemptsExhausted,

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Store not initialized - run 'lockbox init' first")]
    NotInitialized,

    #[error("Store already initialized")]
    AlreadyInitialized,

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Invalid account name: {0}")]
    InvalidAccount(String),

    #[error("Master passphrase cannot be empty")]
    EmptyPassphrase,
}

impl LockboxError {
    /// Whether the error should end the session rather than be reported
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LockboxError::AttemptsExhausted | LockboxError::Persistence(_)
        )
    }
}

/// Look for a `LockboxError` anywhere in an anyhow chain
pub fn kind(err: &anyhow::Error) -> Option<&LockboxError> {
    err.chain().find_map(|cause| cause.downcast_ref::<LockboxError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_kind_through_context() {
        let err = Err::<(), _>(LockboxError::NotFound("github".into()))
            .context("while deleting")
            .unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::NotFound(a)) if a == "github"));
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(LockboxError::AttemptsExhausted.is_fatal());
        assert!(LockboxError::Persistence("disk full".into()).is_fatal());
        assert!(!LockboxError::NotFound("x".into()).is_fatal());
        assert!(!LockboxError::Decryption("bad tag".into()).is_fatal());
    }
}
