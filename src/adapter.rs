//! The server adapter contract (§6): the remote transport is an external
//! collaborator, so this crate only depends on the capability trait below
//! plus the error taxonomy it is expected to surface. Grounded on the
//! teacher's `network::error::NetworkError` convention of one `thiserror`
//! enum per boundary, with a `Conflict` variant promoted to first-class
//! status since [`crate::sync::executor::SyncExecutor`] pattern-matches on
//! it specifically.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::{StateDescriptor, UserCredentials, VaultItem};

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors the server adapter is expected to map its transport status codes
/// onto. The core never inspects anything more specific than these
/// variants.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    /// The server's optimistic-concurrency guard rejected an Update or
    /// Delete because the caller's `version` no longer matches its stored
    /// copy. Consumed specifically by the sync executor's conflict-refresh
    /// path.
    #[error("version conflict for item {client_side_id}")]
    Conflict { client_side_id: Uuid },

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("internal server error: {0}")]
    InternalServerError(String),

    #[error("adapter operation cancelled")]
    Cancelled,
}

/// Response to a successful [`ServerAdapter::login`] call.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user_id: i64,
    /// base64-decoded AES-256-GCM sealed DEK.
    pub encrypted_master_key: Vec<u8>,
}

/// One item's worth of optimistic-concurrency-guarded update.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub client_side_id: Uuid,
    /// The version the client observed before editing — the prior
    /// version, never the post-write one (§9 "Optimistic-concurrency
    /// field").
    pub prior_version: u64,
    pub updated_hash: String,
    pub payload: crate::model::CipheredPayload,
}

/// One item's worth of optimistic-concurrency-guarded delete.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub client_side_id: Uuid,
    pub prior_version: u64,
}

/// The remote transport this crate depends on only through this trait.
/// Every method takes a [`CancellationToken`] (§5) and must honor it rather
/// than let it ride along unused.
#[async_trait]
pub trait ServerAdapter: Send + Sync {
    async fn register(&self, ctx: &CancellationToken, credentials: &UserCredentials) -> AdapterResult<()>;

    /// Fetch the per-user salt needed to re-derive the KEK at login.
    async fn request_salt(&self, ctx: &CancellationToken, login: &str) -> AdapterResult<Vec<u8>>;

    async fn login(&self, ctx: &CancellationToken, login: &str, auth_hash: &[u8]) -> AdapterResult<LoginResponse>;

    async fn get_server_states(&self, ctx: &CancellationToken, user_id: i64) -> AdapterResult<Vec<StateDescriptor>>;

    async fn download(&self, ctx: &CancellationToken, user_id: i64, ids: &[Uuid]) -> AdapterResult<Vec<VaultItem>>;

    async fn upload(&self, ctx: &CancellationToken, user_id: i64, items: Vec<VaultItem>) -> AdapterResult<()>;

    async fn update(&self, ctx: &CancellationToken, user_id: i64, updates: Vec<UpdateRequest>) -> AdapterResult<()>;

    async fn delete(&self, ctx: &CancellationToken, user_id: i64, deletes: Vec<DeleteRequest>) -> AdapterResult<()>;
}
