//! Derives and wraps the secrets that protect a user's vault: the
//! password-derived key-encryption key (KEK), the random data-encryption
//! key (DEK), and the proof-of-possession auth-hash.
//!
//! Grounded on the teacher's `crypto::argon2` module (Argon2id parameters,
//! salt handling) and `security::encryption::EncryptionManager` (AES-GCM
//! envelope sealing), generalised to wrap an arbitrary DEK under a
//! password-derived KEK instead of deriving an Ed25519 seed.

use argon2::{Algorithm, Argon2, Params, Version};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::config::KdfParams;

use super::aead;
use super::error::{CryptoError, CryptoResult};

pub const SALT_LEN: usize = 16;
pub const DEK_LEN: usize = 32;
pub const KEK_LEN: usize = 32;

/// Stateless derivation and envelope-encryption operations. Kept as a
/// zero-sized type with associated functions, mirroring how the teacher's
/// crypto managers group related operations under one namespace even when
/// they hold no per-instance state.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyChain;

impl KeyChain {
    /// Generate a fresh random salt for KEK derivation.
    pub fn generate_encryption_salt() -> CryptoResult<[u8; SALT_LEN]> {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CryptoError::RandomUnavailable {
                message: e.to_string(),
            })?;
        Ok(salt)
    }

    /// Generate a fresh random 32-byte data-encryption key.
    pub fn generate_dek() -> CryptoResult<[u8; DEK_LEN]> {
        let mut dek = [0u8; DEK_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut dek)
            .map_err(|e| CryptoError::RandomUnavailable {
                message: e.to_string(),
            })?;
        Ok(dek)
    }

    /// Derive the KEK from the master password and per-user salt via
    /// Argon2id. Deterministic: the same `(password, salt, params)` always
    /// yields the same KEK, which is what lets the client re-derive it on
    /// every login without the server ever seeing the password.
    pub fn generate_kek(
        master_password: &str,
        salt: &[u8],
        params: &KdfParams,
    ) -> CryptoResult<[u8; KEK_LEN]> {
        let argon2_params = Params::new(
            params.memory_cost_kib,
            params.time_cost,
            params.parallelism,
            Some(KEK_LEN),
        )
        .map_err(|e| CryptoError::KeyDerivation {
            message: format!("invalid Argon2 parameters: {e}"),
        })?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut kek = [0u8; KEK_LEN];
        argon2
            .hash_password_into(master_password.as_bytes(), salt, &mut kek)
            .map_err(|e| CryptoError::KeyDerivation {
                message: e.to_string(),
            })?;
        Ok(kek)
    }

    /// Seal the DEK under the KEK: AES-256-GCM with a fresh random nonce.
    pub fn encrypt_dek(dek: &[u8; DEK_LEN], kek: &[u8; KEK_LEN]) -> CryptoResult<Vec<u8>> {
        aead::seal(kek, dek)
    }

    /// Open a DEK blob sealed by [`Self::encrypt_dek`]. A tag mismatch here
    /// is the client's only signal that the supplied password was wrong;
    /// it is intentionally indistinguishable from any other corruption of
    /// the blob.
    pub fn decrypt_dek(blob: &[u8], kek: &[u8; KEK_LEN]) -> CryptoResult<[u8; DEK_LEN]> {
        let plaintext = aead::open(kek, blob)?;
        plaintext
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::DecryptFailure {
                message: format!("decrypted DEK has wrong length: {} bytes", v.len()),
            })
    }

    /// Proof-of-possession token sent to the server in place of the
    /// password: `HMAC-SHA-256(key = KEK, message = fixed_auth_salt)`. The
    /// fixed salt is a global constant (not per-user) so that knowing it
    /// grants no advantage; it exists purely to decouple the auth-hash
    /// from the KEK itself.
    pub fn compute_auth_hash(kek: &[u8; KEK_LEN], fixed_auth_salt: &str) -> CryptoResult<[u8; 32]> {
        let mut mac = Hmac::<Sha256>::new_from_slice(kek).map_err(|e| CryptoError::KeyDerivation {
            message: e.to_string(),
        })?;
        mac.update(fixed_auth_salt.as_bytes());
        Ok(mac.finalize().into_bytes().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kek_derivation_is_deterministic_for_the_same_inputs() {
        let salt = [3u8; SALT_LEN];
        let params = KdfParams::interactive();
        let a = KeyChain::generate_kek("correct-password", &salt, &params).unwrap();
        let b = KeyChain::generate_kek("correct-password", &salt, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn kek_derivation_differs_across_passwords_and_salts() {
        let salt = [3u8; SALT_LEN];
        let params = KdfParams::interactive();
        let a = KeyChain::generate_kek("correct-password", &salt, &params).unwrap();
        let b = KeyChain::generate_kek("wrong-password", &salt, &params).unwrap();
        let c = KeyChain::generate_kek("correct-password", &[4u8; SALT_LEN], &params).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn dek_envelope_round_trips_and_rejects_the_wrong_kek() {
        let dek = KeyChain::generate_dek().unwrap();
        let kek = [9u8; KEK_LEN];
        let wrong_kek = [10u8; KEK_LEN];

        let blob = KeyChain::encrypt_dek(&dek, &kek).unwrap();
        assert_eq!(KeyChain::decrypt_dek(&blob, &kek).unwrap(), dek);
        assert!(KeyChain::decrypt_dek(&blob, &wrong_kek).is_err());
    }

    #[test]
    fn auth_hash_is_deterministic_and_differs_from_the_kek() {
        let kek = [5u8; KEK_LEN];
        let a = KeyChain::compute_auth_hash(&kek, "global-salt").unwrap();
        let b = KeyChain::compute_auth_hash(&kek, "global-salt").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.to_vec(), kek.to_vec());
    }
}
