//! Vault-wide tunables.
//!
//! Loading these from a file, environment variables, or CLI flags is the
//! job of an external collaborator; this module only defines the shape the
//! loaded values take, the same way the teacher codebase keeps plain
//! `Default`-able config structs in its `config` module independent of
//! however those structs end up populated at the edges.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters for the Argon2id key-derivation function used by
/// [`crate::crypto::keychain::KeyChain::generate_kek`].
///
/// The defaults mirror the teacher's own `Argon2Params::default()`: 64 MiB
/// of memory, 3 iterations, 4 lanes of parallelism. That configuration
/// targets at least 100ms of wall-clock work on a contemporary laptop and
/// resists GPU/ASIC acceleration far better than an iterated hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost_kib: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost_kib: 65_536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// A lighter profile, useful for interactive re-derivation where the
    /// caller already proved possession of the password once this session.
    pub fn interactive() -> Self {
        Self {
            memory_cost_kib: 32_768,
            time_cost: 2,
            parallelism: 2,
        }
    }
}

/// The fixed, global salt mixed into the auth-hash. Identical across every
/// user by design: it exists only to make `auth_hash != KEK`, not to add
/// per-user entropy (the per-user salt already does that for the KEK
/// derivation itself).
pub const GLOBAL_AUTH_SALT: &str = "passkeeper-core/auth-hash/v1";

/// Default interval for the periodic background sync job.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Top-level settings an embedder threads through [`crate::service`] and
/// [`crate::sync`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub kdf: KdfParams,
    #[serde(with = "duration_secs")]
    pub sync_interval: Duration,
    /// The fixed constant from [`GLOBAL_AUTH_SALT`], carried as a field so
    /// an embedder's config loader can see it and so tests can override it
    /// without touching the constant itself.
    pub global_auth_salt: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            global_auth_salt: GLOBAL_AUTH_SALT.to_string(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(de)?;
        Ok(Duration::from_secs(secs))
    }
}
