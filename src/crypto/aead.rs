//! Shared AES-256-GCM seal/open helpers used by both the key-chain (to
//! wrap the DEK) and the payload cipher (to seal individual fields).
//! Grounded on the teacher's `EncryptionManager`, but returns the raw
//! `nonce ∥ ciphertext ∥ tag` blob the spec's wire format calls for
//! instead of splitting the tag into its own container field.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use super::error::{CryptoError, CryptoResult};

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Seal `plaintext` under `key`, returning `nonce(12) ∥ ciphertext ∥ tag(16)`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::CipherFailure {
            message: e.to_string(),
        })?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(nonce.as_slice());
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Open a `nonce ∥ ciphertext ∥ tag` blob sealed by [`seal`].
pub fn open(key: &[u8; 32], blob: &[u8]) -> CryptoResult<Vec<u8>> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::DecryptFailure {
            message: format!(
                "ciphertext blob too short: {} bytes, need at least {}",
                blob.len(),
                NONCE_LEN + TAG_LEN
            ),
        });
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::DecryptFailure {
            message: e.to_string(),
        })
}
