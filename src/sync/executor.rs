//! Applies a [`SyncPlan`] against the server adapter and the local store
//! (§4.5), including the conflict-refresh path that re-pulls authoritative
//! state instead of retrying a rejected mutation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use uuid::Uuid;

use crate::adapter::{AdapterError, DeleteRequest, ServerAdapter, UpdateRequest};
use crate::store::LocalStore;

use super::error::{SyncCategory, SyncError, SyncResult};
use super::planner::{build_plan, SyncPlan};

/// Anything that can drive a full sync for a user. [`SyncExecutor`]
/// implements this directly; tests substitute a spy to observe call
/// cadence without a real adapter/store.
#[async_trait]
pub trait Syncer: Send + Sync {
    async fn full_sync(&self, user_id: i64, ctx: &CancellationToken) -> SyncResult<()>;
}

/// Drives [`build_plan`] and then [`SyncExecutor::execute`]. Holds no
/// per-sync state beyond the adapter/store handles it was built with.
pub struct SyncExecutor {
    store: Arc<dyn LocalStore>,
    adapter: Arc<dyn ServerAdapter>,
}

impl SyncExecutor {
    pub fn new(store: Arc<dyn LocalStore>, adapter: Arc<dyn ServerAdapter>) -> Self {
        Self { store, adapter }
    }

    /// Pull both sides' state, plan, and execute — the one entry point
    /// [`super::job::SyncJob`] calls on every tick.
    pub async fn full_sync(&self, user_id: i64, ctx: &CancellationToken) -> SyncResult<()> {
        if ctx.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let server_states = self.adapter.get_server_states(ctx, user_id).await?;
        let client_states = self.store.get_all_states(ctx, user_id).await?;
        let plan = build_plan(&server_states, &client_states, ctx)?;
        self.execute(user_id, plan, ctx).await
    }

    /// Apply `plan` in the fixed category order
    /// Download → Upload → Update → DeleteClient → DeleteServer. Failure
    /// in any single operation aborts the remainder of the plan; earlier
    /// progress is not rolled back.
    pub async fn execute(&self, user_id: i64, plan: SyncPlan, ctx: &CancellationToken) -> SyncResult<()> {
        self.run_download(user_id, &plan, ctx).await?;
        self.run_upload(user_id, &plan, ctx).await?;
        self.run_update(user_id, &plan, ctx).await?;
        self.run_delete_client(user_id, &plan, ctx).await?;
        self.run_delete_server(user_id, &plan, ctx).await?;
        Ok(())
    }

    async fn run_download(&self, user_id: i64, plan: &SyncPlan, ctx: &CancellationToken) -> SyncResult<()> {
        if plan.download.is_empty() {
            return Ok(());
        }
        if ctx.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let ids: Vec<Uuid> = plan.download.iter().map(|s| s.client_side_id).collect();
        let items = self.adapter.download(ctx, user_id, &ids).await.map_err(|e| {
            SyncError::phase(SyncCategory::Download, ids[0], SyncError::Adapter(e))
        })?;
        self.store.save(ctx, items).await.map_err(|e| {
            SyncError::phase(SyncCategory::Download, ids[0], SyncError::Store(e))
        })?;
        Ok(())
    }

    async fn run_upload(&self, user_id: i64, plan: &SyncPlan, ctx: &CancellationToken) -> SyncResult<()> {
        if plan.upload.is_empty() {
            return Ok(());
        }
        if ctx.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let mut items = Vec::with_capacity(plan.upload.len());
        for descriptor in &plan.upload {
            let item = self
                .store
                .get(ctx, descriptor.client_side_id, user_id)
                .await
                .map_err(|e| {
                    SyncError::phase(SyncCategory::Upload, descriptor.client_side_id, SyncError::Store(e))
                })?;
            items.push(item);
        }
        self.adapter.upload(ctx, user_id, items).await.map_err(|e| {
            SyncError::phase(SyncCategory::Upload, plan.upload[0].client_side_id, SyncError::Adapter(e))
        })?;
        Ok(())
    }

    async fn run_update(&self, user_id: i64, plan: &SyncPlan, ctx: &CancellationToken) -> SyncResult<()> {
        for descriptor in &plan.update {
            if ctx.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            let item = self
                .store
                .get(ctx, descriptor.client_side_id, user_id)
                .await
                .map_err(|e| {
                    SyncError::phase(SyncCategory::Update, descriptor.client_side_id, SyncError::Store(e))
                })?;

            let request = UpdateRequest {
                client_side_id: item.client_side_id,
                prior_version: item.version,
                updated_hash: item.hash.clone(),
                payload: item.payload.clone(),
            };

            match self.adapter.update(ctx, user_id, vec![request]).await {
                Ok(()) => {}
                Err(AdapterError::Conflict { client_side_id }) => {
                    self.conflict_refresh(ctx, user_id, client_side_id).await.map_err(|e| {
                        SyncError::phase(SyncCategory::Update, client_side_id, e)
                    })?;
                }
                Err(e) => {
                    return Err(SyncError::phase(
                        SyncCategory::Update,
                        descriptor.client_side_id,
                        SyncError::Adapter(e),
                    ))
                }
            }
        }
        Ok(())
    }

    async fn run_delete_client(&self, user_id: i64, plan: &SyncPlan, ctx: &CancellationToken) -> SyncResult<()> {
        for descriptor in &plan.delete_client {
            if ctx.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            self.store
                .delete_private_data(ctx, descriptor.client_side_id, user_id)
                .await
                .map_err(|e| {
                    SyncError::phase(SyncCategory::DeleteClient, descriptor.client_side_id, SyncError::Store(e))
                })?;
        }
        Ok(())
    }

    async fn run_delete_server(&self, user_id: i64, plan: &SyncPlan, ctx: &CancellationToken) -> SyncResult<()> {
        for descriptor in &plan.delete_server {
            if ctx.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            let item = self
                .store
                .get(ctx, descriptor.client_side_id, user_id)
                .await
                .map_err(|e| {
                    SyncError::phase(SyncCategory::DeleteServer, descriptor.client_side_id, SyncError::Store(e))
                })?;

            let request = DeleteRequest {
                client_side_id: item.client_side_id,
                prior_version: item.version,
            };

            match self.adapter.delete(ctx, user_id, vec![request]).await {
                Ok(()) => {}
                Err(AdapterError::Conflict { client_side_id }) => {
                    self.conflict_refresh(ctx, user_id, client_side_id).await.map_err(|e| {
                        SyncError::phase(SyncCategory::DeleteServer, client_side_id, e)
                    })?;
                }
                Err(e) => {
                    return Err(SyncError::phase(
                        SyncCategory::DeleteServer,
                        descriptor.client_side_id,
                        SyncError::Adapter(e),
                    ))
                }
            }
        }
        Ok(())
    }

    /// On a reported version conflict, download the authoritative item
    /// and overwrite the local row instead of retrying the mutation. If
    /// the server has nothing for this id, it is treated as absent and no
    /// further action is taken — the next periodic sync re-plans with
    /// fresh state.
    async fn conflict_refresh(&self, ctx: &CancellationToken, user_id: i64, client_side_id: Uuid) -> SyncResult<()> {
        warn!(%client_side_id, "version conflict reported by server, refreshing from authoritative state");
        let items = self.adapter.download(ctx, user_id, &[client_side_id]).await?;
        if items.is_empty() {
            return Ok(());
        }
        self.store.save(ctx, items).await?;
        Ok(())
    }
}

#[async_trait]
impl Syncer for SyncExecutor {
    async fn full_sync(&self, user_id: i64, ctx: &CancellationToken) -> SyncResult<()> {
        let result = SyncExecutor::full_sync(self, user_id, ctx).await;
        if let Err(ref e) = result {
            error!(user_id, error = %e, "full sync failed");
        }
        result
    }
}
