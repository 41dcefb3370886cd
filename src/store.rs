//! The local persistent store contract (§6): the embedded/relational
//! database is an external collaborator, so the core depends only on this
//! capability trait.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::{Session, StateDescriptor, VaultItem};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("item {client_side_id} not found for user {user_id}")]
    NotFound { client_side_id: Uuid, user_id: i64 },

    #[error("local store error: {0}")]
    Internal(String),

    #[error("store operation cancelled")]
    Cancelled,
}

/// The local database this crate depends on only through this trait. Every
/// method takes a [`CancellationToken`] (§5 "every public operation accepts
/// a `tokio_util::sync::CancellationToken`") and must honor it rather than
/// let it ride along unused.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn save(&self, ctx: &CancellationToken, items: Vec<VaultItem>) -> StoreResult<()>;

    async fn get(&self, ctx: &CancellationToken, client_side_id: Uuid, user_id: i64) -> StoreResult<VaultItem>;

    async fn get_all(&self, ctx: &CancellationToken, user_id: i64) -> StoreResult<Vec<VaultItem>>;

    async fn get_all_states(&self, ctx: &CancellationToken, user_id: i64) -> StoreResult<Vec<StateDescriptor>>;

    async fn update(&self, ctx: &CancellationToken, item: VaultItem) -> StoreResult<()>;

    /// Soft-delete: mark the row as a tombstone, never physically remove
    /// it (§3 "Items are never hard-deleted below the application layer").
    async fn delete_private_data(&self, ctx: &CancellationToken, client_side_id: Uuid, user_id: i64) -> StoreResult<()>;

    async fn increment_version(&self, ctx: &CancellationToken, client_side_id: Uuid, user_id: i64) -> StoreResult<()>;

    async fn save_session(&self, ctx: &CancellationToken, session: Session) -> StoreResult<()>;

    async fn load_session(&self, ctx: &CancellationToken) -> StoreResult<Option<Session>>;

    async fn clear_session(&self, ctx: &CancellationToken) -> StoreResult<()>;
}
