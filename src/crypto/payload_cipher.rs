//! Per-field authenticated encryption of vault payloads and the
//! deterministic content hash the sync planner consumes.
//!
//! Grounded on the teacher's `security::encryption::EncryptionManager`
//! (AES-GCM sealing of arbitrary byte strings) generalised from "one
//! blob" to "one ciphered field per payload field", plus `crypto::argon2`'s
//! `ZeroizeOnDrop` convention for key material.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use tokio::sync::RwLock;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::model::{CipheredPayload, PlainData, PlainPayload};

use super::aead;
use super::error::{CryptoError, CryptoResult};
use super::keychain::DEK_LEN;

/// A domain-separation key for [`PayloadCipher::compute_hash`]. Fixed and
/// public (unlike the DEK) so the server — which only ever holds
/// ciphertext — can recompute the same hash over what it stores.
const HASH_DOMAIN_KEY: &str = "passkeeper-core/payload-hash/v1";

/// The data-encryption key, held only in memory and zeroized on drop. Not
/// `Clone`: a `PayloadCipher` owns exactly one live copy at a time.
#[derive(ZeroizeOnDrop)]
struct DekHandle([u8; DEK_LEN]);

impl Zeroize for DekHandle {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Encrypts and decrypts vault payload fields with a single in-memory DEK,
/// installed after a successful login via [`Self::set_key`] and wiped on
/// logout via [`Self::clear_key`] (or when the cipher itself is dropped).
#[derive(Default)]
pub struct PayloadCipher {
    dek: RwLock<Option<DekHandle>>,
}

impl PayloadCipher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the DEK obtained from [`super::keychain::KeyChain::decrypt_dek`].
    pub async fn set_key(&self, dek: [u8; DEK_LEN]) {
        *self.dek.write().await = Some(DekHandle(dek));
    }

    /// Wipe the in-memory DEK. Idempotent.
    pub async fn clear_key(&self) {
        self.dek.write().await.take();
    }

    pub async fn has_key(&self) -> bool {
        self.dek.read().await.is_some()
    }

    async fn with_key<T>(&self, f: impl FnOnce(&[u8; DEK_LEN]) -> CryptoResult<T>) -> CryptoResult<T> {
        let guard = self.dek.read().await;
        let handle = guard.as_ref().ok_or(CryptoError::KeyNotSet)?;
        f(&handle.0)
    }

    /// Seal every field of `plain` except `type`, which is copied verbatim.
    /// Optional fields that are absent in `plain` remain absent in the
    /// ciphered output.
    pub async fn encrypt_payload(&self, plain: &PlainPayload) -> CryptoResult<CipheredPayload> {
        self.with_key(|dek| {
            let metadata = seal_field(dek, &plain.metadata)?;
            let data = seal_field(dek, &plain.data)?;
            let notes = plain
                .notes
                .as_ref()
                .map(|n| seal_field(dek, n))
                .transpose()?;
            let additional_fields = plain
                .additional_fields
                .as_ref()
                .map(|v| seal_field(dek, v))
                .transpose()?;

            Ok(CipheredPayload {
                metadata,
                payload_type: plain.payload_type,
                data,
                notes,
                additional_fields,
            })
        })
        .await
    }

    /// Inverse of [`Self::encrypt_payload`].
    pub async fn decrypt_payload(&self, ciphered: &CipheredPayload) -> CryptoResult<PlainPayload> {
        self.with_key(|dek| {
            let metadata = open_field(dek, &ciphered.metadata)?;
            let data: PlainData = open_field(dek, &ciphered.data)?;
            let notes = ciphered
                .notes
                .as_deref()
                .map(|n| open_field(dek, n))
                .transpose()?;
            let additional_fields = ciphered
                .additional_fields
                .as_deref()
                .map(|v| open_field(dek, v))
                .transpose()?;

            Ok(PlainPayload {
                metadata,
                payload_type: ciphered.payload_type,
                data,
                notes,
                additional_fields,
            })
        })
        .await
    }

    /// Deterministic, collision-resistant hash over the ciphered fields in
    /// canonical order (metadata, type, data, notes-or-empty,
    /// additional-fields-or-empty). Does not require the DEK: the server
    /// can compute the same hash over what it holds.
    pub fn compute_hash(ciphered: &CipheredPayload) -> String {
        let mut hasher = blake3::Hasher::new_keyed(&hash_domain_key());
        hasher.update(ciphered.metadata.as_bytes());
        hasher.update(&[u8::from(ciphered.payload_type)]);
        hasher.update(ciphered.data.as_bytes());
        hasher.update(ciphered.notes.as_deref().unwrap_or("").as_bytes());
        hasher.update(ciphered.additional_fields.as_deref().unwrap_or("").as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

fn hash_domain_key() -> [u8; 32] {
    *blake3::hash(HASH_DOMAIN_KEY.as_bytes()).as_bytes()
}

fn seal_field<T: Serialize>(dek: &[u8; DEK_LEN], field: &T) -> CryptoResult<String> {
    let bytes = serde_json::to_vec(field).map_err(|e| CryptoError::InvalidInput {
        message: e.to_string(),
    })?;
    let blob = aead::seal(dek, &bytes)?;
    Ok(BASE64.encode(blob))
}

fn open_field<T: serde::de::DeserializeOwned>(dek: &[u8; DEK_LEN], ciphertext: &str) -> CryptoResult<T> {
    let blob = BASE64
        .decode(ciphertext)
        .map_err(|e| CryptoError::DecryptFailure {
            message: format!("invalid base64: {e}"),
        })?;
    let bytes = aead::open(dek, &blob)?;
    serde_json::from_slice(&bytes).map_err(|e| CryptoError::InvalidInput {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemMetadata, LoginData, PayloadType};

    fn sample_payload() -> PlainPayload {
        PlainPayload {
            metadata: ItemMetadata {
                name: "GitHub".into(),
            },
            payload_type: PayloadType::LoginPassword,
            data: PlainData::Login(LoginData {
                username: "alice@example.com".into(),
                password: "gh-secret-token".into(),
                uris: vec!["https://github.com".into()],
                totp: None,
            }),
            notes: Some("personal account".into()),
            additional_fields: None,
        }
    }

    #[tokio::test]
    async fn operations_fail_before_a_key_is_set() {
        let cipher = PayloadCipher::new();
        let err = cipher.encrypt_payload(&sample_payload()).await.unwrap_err();
        assert!(matches!(err, CryptoError::KeyNotSet));
    }

    #[tokio::test]
    async fn encrypt_then_decrypt_round_trips() {
        let cipher = PayloadCipher::new();
        cipher.set_key([1u8; DEK_LEN]).await;

        let plain = sample_payload();
        let ciphered = cipher.encrypt_payload(&plain).await.unwrap();
        let decrypted = cipher.decrypt_payload(&ciphered).await.unwrap();

        assert_eq!(decrypted, plain);
    }

    #[tokio::test]
    async fn ciphertext_never_contains_the_plaintext_secrets() {
        let cipher = PayloadCipher::new();
        cipher.set_key([2u8; DEK_LEN]).await;

        let ciphered = cipher.encrypt_payload(&sample_payload()).await.unwrap();
        let blob = serde_json::to_string(&ciphered).unwrap();

        assert!(!blob.contains("alice@example.com"));
        assert!(!blob.contains("gh-secret-token"));
    }

    #[tokio::test]
    async fn decrypting_with_a_different_key_fails() {
        let cipher = PayloadCipher::new();
        cipher.set_key([3u8; DEK_LEN]).await;
        let ciphered = cipher.encrypt_payload(&sample_payload()).await.unwrap();

        let other = PayloadCipher::new();
        other.set_key([4u8; DEK_LEN]).await;
        let err = other.decrypt_payload(&ciphered).await.unwrap_err();
        assert!(matches!(err, CryptoError::DecryptFailure { .. }));
    }

    #[tokio::test]
    async fn two_encryptions_of_the_same_payload_produce_distinct_ciphertext() {
        let cipher = PayloadCipher::new();
        cipher.set_key([5u8; DEK_LEN]).await;

        let plain = sample_payload();
        let a = cipher.encrypt_payload(&plain).await.unwrap();
        let b = cipher.encrypt_payload(&plain).await.unwrap();

        assert_ne!(a.metadata, b.metadata);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn compute_hash_is_deterministic_and_stable_length() {
        let a = CipheredPayload {
            metadata: "m1".into(),
            payload_type: PayloadType::Text,
            data: "d1".into(),
            notes: None,
            additional_fields: None,
        };
        let b = a.clone();

        let hash_a = PayloadCipher::compute_hash(&a);
        let hash_b = PayloadCipher::compute_hash(&b);
        assert_eq!(hash_a, hash_b);
        assert_eq!(hash_a.len(), 64); // 32-byte BLAKE3 digest, hex-encoded

        let mut c = a;
        c.data = "different".into();
        assert_ne!(PayloadCipher::compute_hash(&c), hash_a);
    }

    #[tokio::test]
    async fn clear_key_forces_subsequent_operations_to_fail() {
        let cipher = PayloadCipher::new();
        cipher.set_key([6u8; DEK_LEN]).await;
        assert!(cipher.has_key().await);

        cipher.clear_key().await;
        assert!(!cipher.has_key().await);

        let err = cipher.encrypt_payload(&sample_payload()).await.unwrap_err();
        assert!(matches!(err, CryptoError::KeyNotSet));
    }
}
