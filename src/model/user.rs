use serde::{Deserialize, Serialize};

/// The user record as the server sees it: a login, a per-user salt, the
/// DEK wrapped under the KEK, and a proof-of-possession hash. The master
/// password never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub login: String,
    /// base64-encoded random salt used to derive the KEK.
    pub encryption_salt: String,
    /// base64-encoded AES-256-GCM sealed DEK (`nonce ∥ ciphertext ∥ tag`).
    pub encrypted_master_key: String,
    /// base64-encoded HMAC-SHA-256(KEK, GLOBAL_AUTH_SALT).
    pub auth_hash: String,
}
