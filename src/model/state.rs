use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A plaintext-free summary of a [`super::VaultItem`]'s state, used
/// exclusively by the sync planner to decide what to do without ever
/// touching the data-encryption key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub client_side_id: Uuid,
    pub version: u64,
    pub hash: String,
    pub deleted: bool,
}

impl StateDescriptor {
    pub fn new(client_side_id: Uuid, version: u64, hash: impl Into<String>, deleted: bool) -> Self {
        Self {
            client_side_id,
            version,
            hash: hash.into(),
            deleted,
        }
    }
}
