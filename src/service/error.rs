use thiserror::Error;
use uuid::Uuid;

use crate::adapter::AdapterError;
use crate::crypto::CryptoError;
use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors from [`super::item_service::ItemService`]. Each variant wraps the
/// subsystem error it came from rather than flattening everything into a
/// string, the same way the teacher threads its own subsystem errors
/// through the service layer with `#[from]`.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// An operation was attempted before [`super::auth_flow::AuthFlow`]
    /// installed a DEK for the current session.
    #[error("no active session: log in before using the vault")]
    NotLoggedIn,

    /// Decryption of a single vault item failed (§4.3 "failure of any
    /// single decryption aborts with `DecryptFailure` naming the item"),
    /// mirroring [`crate::sync::error::SyncError::Phase`]'s shape of
    /// naming the item the failure belongs to rather than losing it in a
    /// bare `#[from]` conversion.
    #[error("decryption failed for item {client_side_id}: {source}")]
    ItemDecryptFailure {
        client_side_id: Uuid,
        #[source]
        source: CryptoError,
    },
}

impl ServiceError {
    pub fn item_decrypt_failure(client_side_id: Uuid, source: CryptoError) -> Self {
        ServiceError::ItemDecryptFailure { client_side_id, source }
    }
}

/// Errors from [`super::auth_flow::AuthFlow`]. `InvalidCredentials` is
/// returned for both an unknown login and a wrong password, deliberately —
/// distinguishing the two would let a caller enumerate registered logins.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("that login is already registered")]
    LoginTaken,
}

impl AuthError {
    /// Collapse the server's `Unauthorized`/`NotFound` responses and a
    /// failed DEK-envelope open into the single, undifferentiated
    /// `InvalidCredentials` outward signal (§7 "auth failures must not leak
    /// which part of the check failed").
    pub fn normalize_auth_failure(self) -> Self {
        match self {
            AuthError::Adapter(AdapterError::Unauthorized)
            | AuthError::Adapter(AdapterError::NotFound(_))
            | AuthError::Crypto(CryptoError::DecryptFailure { .. }) => AuthError::InvalidCredentials,
            other => other,
        }
    }
}
