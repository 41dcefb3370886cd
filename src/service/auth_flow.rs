//! Register/Login orchestration (§4.7): composes [`KeyChain`] with the
//! server adapter and installs the resulting DEK into [`PayloadCipher`].

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::adapter::ServerAdapter;
use crate::config::VaultConfig;
#[cfg(all(test, feature = "mock"))]
use crate::config::KdfParams;
use crate::crypto::{KeyChain, PayloadCipher};
use crate::model::{Session, UserCredentials};
use crate::store::LocalStore;

use super::error::{AuthError, AuthResult};

pub struct AuthFlow {
    adapter: Arc<dyn ServerAdapter>,
    store: Arc<dyn LocalStore>,
    cipher: Arc<PayloadCipher>,
    config: VaultConfig,
}

impl AuthFlow {
    pub fn new(
        adapter: Arc<dyn ServerAdapter>,
        store: Arc<dyn LocalStore>,
        cipher: Arc<PayloadCipher>,
        config: VaultConfig,
    ) -> Self {
        Self {
            adapter,
            store,
            cipher,
            config,
        }
    }

    /// Derive a fresh KEK/DEK pair, wrap the DEK, and register the
    /// resulting credentials with the server. `password` is taken by value
    /// so it's dropped at the end of this call; the caller is responsible
    /// for not retaining its own copy.
    #[instrument(skip(self, password))]
    pub async fn register(&self, ctx: &CancellationToken, login: &str, password: String) -> AuthResult<()> {
        let salt = KeyChain::generate_encryption_salt()?;
        let dek = KeyChain::generate_dek()?;
        let kek = KeyChain::generate_kek(&password, &salt, &self.config.kdf)?;
        let enc_dek = KeyChain::encrypt_dek(&dek, &kek)?;
        let auth_hash = KeyChain::compute_auth_hash(&kek, &self.config.global_auth_salt)?;

        let credentials = UserCredentials {
            login: login.to_string(),
            encryption_salt: BASE64.encode(salt),
            encrypted_master_key: BASE64.encode(enc_dek),
            auth_hash: BASE64.encode(auth_hash),
        };

        self.adapter
            .register(ctx, &credentials)
            .await
            .map_err(|e| match e {
                crate::adapter::AdapterError::BadRequest(_) => AuthError::LoginTaken,
                other => AuthError::Adapter(other),
            })?;
        Ok(())
    }

    /// Re-derive the KEK from `password` and the server's salt, prove
    /// possession via the auth-hash, unwrap the returned DEK, install it
    /// into the cipher, and persist the session. Any failure along the way
    /// — unknown login, wrong auth-hash, or a DEK that doesn't open under
    /// the re-derived KEK — collapses to [`AuthError::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        ctx: &CancellationToken,
        login: &str,
        password: String,
        token: String,
    ) -> AuthResult<i64> {
        let result = self.login_inner(ctx, login, password, token).await;
        result.map_err(AuthError::normalize_auth_failure)
    }

    async fn login_inner(
        &self,
        ctx: &CancellationToken,
        login: &str,
        password: String,
        token: String,
    ) -> AuthResult<i64> {
        let salt = self.adapter.request_salt(ctx, login).await?;
        let kek = KeyChain::generate_kek(&password, &salt, &self.config.kdf)?;
        let auth_hash = KeyChain::compute_auth_hash(&kek, &self.config.global_auth_salt)?;

        let response = self.adapter.login(ctx, login, &auth_hash).await?;

        let dek = KeyChain::decrypt_dek(&response.encrypted_master_key, &kek)?;

        self.cipher.set_key(dek).await;
        self.store
            .save_session(
                ctx,
                Session {
                    user_id: response.user_id,
                    token,
                },
            )
            .await?;

        Ok(response.user_id)
    }

    /// Wipe the in-memory DEK and the persisted session row. Stopping the
    /// periodic [`super::super::sync::SyncJob`] is the caller's
    /// responsibility, since this type has no handle to it.
    #[instrument(skip(self))]
    pub async fn logout(&self, ctx: &CancellationToken) -> AuthResult<()> {
        self.cipher.clear_key().await;
        self.store.clear_session(ctx).await?;
        Ok(())
    }
}
