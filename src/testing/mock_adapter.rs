use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adapter::{
    AdapterError, AdapterResult, DeleteRequest, LoginResponse, ServerAdapter, UpdateRequest,
};
use crate::model::{StateDescriptor, UserCredentials, VaultItem};

struct RegisteredUser {
    credentials: UserCredentials,
    user_id: i64,
}

/// An in-memory [`ServerAdapter`], the remote-side analogue of
/// [`super::mock_store::InMemoryStore`]. Enforces the same
/// optimistic-concurrency rule a real server would (reject an
/// Update/Delete whose `prior_version` doesn't match its stored copy with
/// `Conflict`), plus a one-shot `conflict_ids` override for tests that
/// want to force a conflict deterministically.
#[derive(Default)]
pub struct InMemoryAdapter {
    users: Mutex<HashMap<String, RegisteredUser>>,
    next_user_id: AtomicI64,
    items: Mutex<HashMap<Uuid, VaultItem>>,
    conflict_ids: Mutex<HashSet<Uuid>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self {
            next_user_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn with_next_user_id(user_id: i64) -> Self {
        let adapter = Self::new();
        adapter.next_user_id.store(user_id, Ordering::SeqCst);
        adapter
    }

    /// Make `client_side_id`'s next Update/Delete call fail with
    /// `Conflict`, and seed `server_item` as the authoritative copy the
    /// resulting conflict-refresh should download.
    pub fn seed_conflict_then_refresh(&self, client_side_id: Uuid, server_item: VaultItem) {
        self.conflict_ids.lock().unwrap().insert(client_side_id);
        self.items.lock().unwrap().insert(client_side_id, server_item);
    }

    /// Seed an item as if it already existed on the server, for Download
    /// phase tests.
    pub fn seed_server_item(&self, item: VaultItem) {
        self.items.lock().unwrap().insert(item.client_side_id, item);
    }
}

#[async_trait]
impl ServerAdapter for InMemoryAdapter {
    async fn register(&self, ctx: &CancellationToken, credentials: &UserCredentials) -> AdapterResult<()> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&credentials.login) {
            return Err(AdapterError::BadRequest(format!(
                "login {} already registered",
                credentials.login
            )));
        }
        let user_id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        users.insert(
            credentials.login.clone(),
            RegisteredUser {
                credentials: credentials.clone(),
                user_id,
            },
        );
        Ok(())
    }

    async fn request_salt(&self, ctx: &CancellationToken, login: &str) -> AdapterResult<Vec<u8>> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let users = self.users.lock().unwrap();
        let user = users
            .get(login)
            .ok_or_else(|| AdapterError::NotFound(login.to_string()))?;
        BASE64
            .decode(&user.credentials.encryption_salt)
            .map_err(|e| AdapterError::InternalServerError(e.to_string()))
    }

    async fn login(&self, ctx: &CancellationToken, login: &str, auth_hash: &[u8]) -> AdapterResult<LoginResponse> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let users = self.users.lock().unwrap();
        let user = users
            .get(login)
            .ok_or_else(|| AdapterError::NotFound(login.to_string()))?;

        let expected = BASE64
            .decode(&user.credentials.auth_hash)
            .map_err(|e| AdapterError::InternalServerError(e.to_string()))?;
        if expected != auth_hash {
            return Err(AdapterError::Unauthorized);
        }

        let encrypted_master_key = BASE64
            .decode(&user.credentials.encrypted_master_key)
            .map_err(|e| AdapterError::InternalServerError(e.to_string()))?;

        Ok(LoginResponse {
            user_id: user.user_id,
            encrypted_master_key,
        })
    }

    async fn get_server_states(&self, ctx: &CancellationToken, user_id: i64) -> AdapterResult<Vec<StateDescriptor>> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
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

    async fn download(&self, ctx: &CancellationToken, user_id: i64, ids: &[Uuid]) -> AdapterResult<Vec<VaultItem>> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let items = self.items.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| items.get(id))
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upload(&self, ctx: &CancellationToken, _user_id: i64, items: Vec<VaultItem>) -> AdapterResult<()> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let mut guard = self.items.lock().unwrap();
        for item in items {
            guard.insert(item.client_side_id, item);
        }
        Ok(())
    }

    async fn update(&self, ctx: &CancellationToken, _user_id: i64, updates: Vec<UpdateRequest>) -> AdapterResult<()> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        for request in updates {
            if self.conflict_ids.lock().unwrap().remove(&request.client_side_id) {
                return Err(AdapterError::Conflict {
                    client_side_id: request.client_side_id,
                });
            }
            let mut guard = self.items.lock().unwrap();
            let stored = guard
                .get_mut(&request.client_side_id)
                .ok_or_else(|| AdapterError::NotFound(request.client_side_id.to_string()))?;
            if stored.version != request.prior_version {
                return Err(AdapterError::Conflict {
                    client_side_id: request.client_side_id,
                });
            }
            stored.payload = request.payload;
            stored.hash = request.updated_hash;
            stored.version += 1;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &CancellationToken, _user_id: i64, deletes: Vec<DeleteRequest>) -> AdapterResult<()> {
        if ctx.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        for request in deletes {
            if self.conflict_ids.lock().unwrap().remove(&request.client_side_id) {
                return Err(AdapterError::Conflict {
                    client_side_id: request.client_side_id,
                });
            }
            let mut guard = self.items.lock().unwrap();
            let stored = guard
                .get_mut(&request.client_side_id)
                .ok_or_else(|| AdapterError::NotFound(request.client_side_id.to_string()))?;
            if stored.version != request.prior_version {
                return Err(AdapterError::Conflict {
                    client_side_id: request.client_side_id,
                });
            }
            stored.deleted = true;
            stored.version += 1;
        }
        Ok(())
    }
}
