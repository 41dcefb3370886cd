//! Vault-level orchestration (§4.3/§4.7): CRUD over encrypted items and the
//! register/login/logout flow that installs the session's DEK.

mod auth_flow;
mod error;
mod item_service;

pub use auth_flow::AuthFlow;
pub use error::{AuthError, AuthResult, ServiceError, ServiceResult};
pub use item_service::{DecryptedItem, ItemService};
