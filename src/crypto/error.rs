//! Error type for [`super::keychain`] and [`super::payload_cipher`],
//! following the teacher's convention of one `thiserror` enum per
//! subsystem instead of a single crate-wide catch-all.

use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// The OS CSPRNG failed to produce randomness. Fatal; never retried
    /// locally.
    #[error("cryptographic random number generation is unavailable: {message}")]
    RandomUnavailable { message: String },

    /// Argon2id key derivation failed, almost always because of invalid
    /// parameters rather than bad input.
    #[error("key derivation failed: {message}")]
    KeyDerivation { message: String },

    /// AES-256-GCM seal failed (e.g. plaintext too long for the AEAD).
    #[error("encryption failed: {message}")]
    CipherFailure { message: String },

    /// AES-256-GCM open failed: tag mismatch or truncated input. This is
    /// indistinguishable from "wrong key" by design.
    #[error("decryption failed: {message}")]
    DecryptFailure { message: String },

    /// A [`super::payload_cipher::PayloadCipher`] operation was attempted
    /// before `set_key` installed a DEK.
    #[error("payload cipher used before a data-encryption key was set")]
    KeyNotSet,

    /// A field failed to (de)serialize to/from the byte string that gets
    /// encrypted.
    #[error("invalid payload field: {message}")]
    InvalidInput { message: String },
}
