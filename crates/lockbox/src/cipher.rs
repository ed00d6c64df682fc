//! Cipher adapter - sealing and opening individual secrets
//!
//! AES-256-GCM with a random 96-bit nonce per secret. A sealed secret is
//! `BASE64(nonce || ciphertext || tag)`, which keeps the record file
//! readable text.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;

use crate::error::LockboxError;
use crate::key::SymmetricKey;

/// Nonce length in bytes (96 bits for AES-GCM)
const NONCE_LENGTH: usize = 12;

/// Encrypt a plaintext secret
pub fn seal(plaintext: &str, key: &SymmetricKey) -> Result<String, LockboxError> {
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| LockboxError::Encryption(format!("Failed to create cipher: {}", e)))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| LockboxError::Encryption(e.to_string()))?;

    let mut combined = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(&combined))
}

/// Decrypt a sealed secret; fails rather than returning garbage
pub fn open(sealed: &str, key: &SymmetricKey) -> Result<String, LockboxError> {
    let combined = BASE64
        .decode(sealed.trim())
        .map_err(|e| LockboxError::Decryption(format!("Malformed ciphertext: {}", e)))?;

    if combined.len() < NONCE_LENGTH {
        return Err(LockboxError::Decryption("Ciphertext too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LENGTH);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| LockboxError::Decryption(format!("Failed to create cipher: {}", e)))?;
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| LockboxError::Decryption("invalid key or corrupted data".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| LockboxError::Decryption("Secret is not valid UTF-8".to_string()))
}
