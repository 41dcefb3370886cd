use serde::{Deserialize, Serialize};

/// The locally-persisted proof of a successful login, restored on startup
/// so the client doesn't have to re-authenticate on every launch. The
/// token is whatever bearer credential the server adapter's transport
/// wants; this crate treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
}
