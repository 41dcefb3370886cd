//! Vault-level CRUD (§4.3): composes [`PayloadCipher`] with the local store
//! and server adapter, assigning client-side IDs and maintaining each
//! item's local version counter.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::adapter::ServerAdapter;
use crate::crypto::PayloadCipher;
use crate::model::{CipheredPayload, PlainPayload, VaultItem};
use crate::store::LocalStore;

use super::error::{ServiceError, ServiceResult};

/// A decrypted vault entry with the identity fields [`PlainPayload`] itself
/// doesn't carry, returned by [`ItemService::get`]/[`ItemService::get_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedItem {
    pub client_side_id: Uuid,
    pub user_id: i64,
    pub payload: PlainPayload,
}

pub struct ItemService {
    cipher: Arc<PayloadCipher>,
    store: Arc<dyn LocalStore>,
    adapter: Arc<dyn ServerAdapter>,
}

impl ItemService {
    pub fn new(cipher: Arc<PayloadCipher>, store: Arc<dyn LocalStore>, adapter: Arc<dyn ServerAdapter>) -> Self {
        Self {
            cipher,
            store,
            adapter,
        }
    }

    /// Encrypt `plain`, persist it locally at version 0, and attempt an
    /// immediate upload. A failed upload is not an error: the row stays at
    /// version 0, which the next periodic sync's client-only branch will
    /// pick up and upload on its own.
    #[instrument(skip(self, plain))]
    pub async fn create(
        &self,
        ctx: &CancellationToken,
        user_id: i64,
        plain: &PlainPayload,
    ) -> ServiceResult<Uuid> {
        if ctx.is_cancelled() {
            return Err(ServiceError::Store(crate::store::StoreError::Cancelled));
        }

        let client_side_id = Uuid::new_v4();
        let payload = self.cipher.encrypt_payload(plain).await?;
        let hash = PayloadCipher::compute_hash(&payload);
        let now = Utc::now();

        let item = VaultItem {
            client_side_id,
            user_id,
            payload,
            hash,
            version: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.store.save(ctx, vec![item.clone()]).await?;

        match self.adapter.upload(ctx, user_id, vec![item]).await {
            Ok(()) => {
                self.store.increment_version(ctx, client_side_id, user_id).await?;
            }
            Err(e) => {
                warn!(%client_side_id, error = %e, "create upload failed, leaving item for next sync");
            }
        }

        Ok(client_side_id)
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self, ctx: &CancellationToken, user_id: i64) -> ServiceResult<Vec<DecryptedItem>> {
        if ctx.is_cancelled() {
            return Err(ServiceError::Store(crate::store::StoreError::Cancelled));
        }
        let items = self.store.get_all(ctx, user_id).await?;
        let mut decrypted = Vec::with_capacity(items.len());
        for item in items {
            let payload = self
                .cipher
                .decrypt_payload(&item.payload)
                .await
                .map_err(|e| ServiceError::item_decrypt_failure(item.client_side_id, e))?;
            decrypted.push(DecryptedItem {
                client_side_id: item.client_side_id,
                user_id: item.user_id,
                payload,
            });
        }
        Ok(decrypted)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        ctx: &CancellationToken,
        client_side_id: Uuid,
        user_id: i64,
    ) -> ServiceResult<DecryptedItem> {
        if ctx.is_cancelled() {
            return Err(ServiceError::Store(crate::store::StoreError::Cancelled));
        }
        let item = self.store.get(ctx, client_side_id, user_id).await?;
        let payload = self
            .cipher
            .decrypt_payload(&item.payload)
            .await
            .map_err(|e| ServiceError::item_decrypt_failure(item.client_side_id, e))?;
        Ok(DecryptedItem {
            client_side_id: item.client_side_id,
            user_id: item.user_id,
            payload,
        })
    }

    /// Re-encrypt `modified` over the existing row identified by
    /// `client_side_id`, persist locally, and send an update RPC guarded by
    /// the **prior** (pre-edit) version. Bumps the local version only on
    /// server acknowledgement, leaving the row eligible for the planner's
    /// equal-version-diverging-hash branch otherwise.
    #[instrument(skip(self, modified))]
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        client_side_id: Uuid,
        user_id: i64,
        modified: &PlainPayload,
    ) -> ServiceResult<()> {
        if ctx.is_cancelled() {
            return Err(ServiceError::Store(crate::store::StoreError::Cancelled));
        }

        let prior = self.store.get(ctx, client_side_id, user_id).await?;
        let payload: CipheredPayload = self.cipher.encrypt_payload(modified).await?;
        let hash = PayloadCipher::compute_hash(&payload);

        let updated = VaultItem {
            payload: payload.clone(),
            hash: hash.clone(),
            updated_at: Utc::now(),
            ..prior.clone()
        };
        self.store.update(ctx, updated).await?;

        let request = crate::adapter::UpdateRequest {
            client_side_id,
            prior_version: prior.version,
            updated_hash: hash,
            payload,
        };

        match self.adapter.update(ctx, user_id, vec![request]).await {
            Ok(()) => {
                self.store.increment_version(ctx, client_side_id, user_id).await?;
            }
            Err(e) => {
                warn!(%client_side_id, error = %e, "update upload failed, leaving item for next sync");
            }
        }

        Ok(())
    }

    /// Mark the local row as a tombstone and send a delete RPC guarded by
    /// its prior version. Never removes the row from the store.
    #[instrument(skip(self))]
    pub async fn delete(&self, ctx: &CancellationToken, client_side_id: Uuid, user_id: i64) -> ServiceResult<()> {
        if ctx.is_cancelled() {
            return Err(ServiceError::Store(crate::store::StoreError::Cancelled));
        }

        let prior = self.store.get(ctx, client_side_id, user_id).await?;
        self.store.delete_private_data(ctx, client_side_id, user_id).await?;

        let request = crate::adapter::DeleteRequest {
            client_side_id,
            prior_version: prior.version,
        };

        match self.adapter.delete(ctx, user_id, vec![request]).await {
            Ok(()) => {
                self.store.increment_version(ctx, client_side_id, user_id).await?;
            }
            Err(e) => {
                warn!(%client_side_id, error = %e, "delete upload failed, leaving tombstone for next sync");
            }
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::model::{ItemMetadata, LoginData, PayloadType, PlainData};
    use crate::testing::{InMemoryAdapter, InMemoryStore};

    fn sample() -> PlainPayload {
        PlainPayload {
            metadata: ItemMetadata { name: "Email".into() },
            payload_type: PayloadType::LoginPassword,
            data: PlainData::Login(LoginData {
                username: "alice".into(),
                password: "hunter2".into(),
                uris: vec![],
                totp: None,
            }),
            notes: None,
            additional_fields: None,
        }
    }

    async fn service() -> (ItemService, Arc<InMemoryStore>, Arc<InMemoryAdapter>) {
        let cipher = Arc::new(PayloadCipher::new());
        cipher.set_key([7u8; crate::crypto::DEK_LEN]).await;
        let store = Arc::new(InMemoryStore::new());
        let adapter = Arc::new(InMemoryAdapter::new());
        (
            ItemService::new(cipher, store.clone(), adapter.clone()),
            store,
            adapter,
        )
    }

    #[tokio::test]
    async fn create_persists_locally_and_bumps_version_after_upload_succeeds() {
        let (service, store, _adapter) = service().await;
        let ctx = CancellationToken::new();
        let id = service.create(&ctx, 1, &sample()).await.unwrap();

        let stored = store.get(&ctx, id, 1).await.unwrap();
        assert_eq!(stored.version, 1);
        assert!(!stored.deleted);
    }

    #[tokio::test]
    async fn get_round_trips_the_plaintext_payload() {
        let (service, _store, _adapter) = service().await;
        let ctx = CancellationToken::new();
        let id = service.create(&ctx, 2, &sample()).await.unwrap();

        let fetched = service.get(&ctx, id, 2).await.unwrap();
        assert_eq!(fetched.payload, sample());
    }

    #[tokio::test]
    async fn get_all_skips_tombstoned_items() {
        let (service, _store, _adapter) = service().await;
        let ctx = CancellationToken::new();
        let id = service.create(&ctx, 3, &sample()).await.unwrap();
        service.delete(&ctx, id, 3).await.unwrap();

        let all = service.get_all(&ctx, 3).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn update_changes_the_stored_hash_and_keeps_the_prior_version_as_the_guard() {
        let (service, store, _adapter) = service().await;
        let ctx = CancellationToken::new();
        let id = service.create(&ctx, 4, &sample()).await.unwrap();
        let before = store.get(&ctx, id, 4).await.unwrap();

        let mut edited = sample();
        if let PlainData::Login(ref mut login) = edited.data {
            login.password = "new-password".into();
        }
        service.update(&ctx, id, 4, &edited).await.unwrap();

        let after = store.get(&ctx, id, 4).await.unwrap();
        assert_ne!(after.hash, before.hash);
        assert_eq!(after.version, before.version + 1);
    }
}
