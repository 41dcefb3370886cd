use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::{Session, StateDescriptor, VaultItem};
use crate::store::{LocalStore, StoreError, StoreResult};

/// An in-memory [`LocalStore`], mirroring the teacher's own `mock` feature
/// (a stand-in network implementation) but for the local database
/// collaborator instead of the remote one. Used by this crate's test
/// suite; also usable by an embedder that wants to exercise
/// [`crate::service`]/[`crate::sync`] without a real database.
#[derive(Default)]
pub struct InMemoryStore {
    items: Mutex<HashMap<(Uuid, i64), VaultItem>>,
    session: Mutex<Option<Session>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn save(&self, ctx: &CancellationToken, items: Vec<VaultItem>) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut guard = self.items.lock().unwrap();
        for item in items {
            guard.insert((item.client_side_id, item.user_id), item);
        }
        Ok(())
    }

    async fn get(&self, ctx: &CancellationToken, client_side_id: Uuid, user_id: i64) -> StoreResult<VaultItem> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.items
            .lock()
            .unwrap()
            .get(&(client_side_id, user_id))
            .cloned()
            .ok_or(StoreError::NotFound {
                client_side_id,
                user_id,
            })
    }

    async fn get_all(&self, ctx: &CancellationToken, user_id: i64) -> StoreResult<Vec<VaultItem>> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.user_id == user_id && !i.deleted)
            .cloned()
            .collect())
    }

    async fn get_all_states(&self, ctx: &CancellationToken, user_id: i64) -> StoreResult<Vec<StateDescriptor>> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.user_id == user_id)
            .map(VaultItem::state)
            .collect())
    }

    async fn update(&self, ctx: &CancellationToken, item: VaultItem) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.items
            .lock()
            .unwrap()
            .insert((item.client_side_id, item.user_id), item);
        Ok(())
    }

    async fn delete_private_data(
        &self,
        ctx: &CancellationToken,
        client_side_id: Uuid,
        user_id: i64,
    ) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut guard = self.items.lock().unwrap();
        let item = guard
            .get_mut(&(client_side_id, user_id))
            .ok_or(StoreError::NotFound {
                client_side_id,
                user_id,
            })?;
        item.deleted = true;
        Ok(())
    }

    async fn increment_version(
        &self,
        ctx: &CancellationToken,
        client_side_id: Uuid,
        user_id: i64,
    ) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut guard = self.items.lock().unwrap();
        let item = guard
            .get_mut(&(client_side_id, user_id))
            .ok_or(StoreError::NotFound {
                client_side_id,
                user_id,
            })?;
        item.version += 1;
        Ok(())
    }

    async fn save_session(&self, ctx: &CancellationToken, session: Session) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        *self.session.lock().unwrap() = Some(session);
        Ok(())
    }

    async fn load_session(&self, ctx: &CancellationToken) -> StoreResult<Option<Session>> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn clear_session(&self, ctx: &CancellationToken) -> StoreResult<()> {
        if ctx.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.session.lock().unwrap().take();
        Ok(())
    }
}
