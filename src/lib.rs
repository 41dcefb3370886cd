//! Client-side encrypted password vault core.
//!
//! This crate implements the three tightly coupled subsystems that make the
//! vault work end-to-end without ever exposing the master password or the
//! data-encryption key to the server:
//!
//! - [`crypto`]: key-chain (KEK/DEK lifecycle) and per-field payload cipher.
//! - [`sync`]: the pure [`sync::build_plan`] comparator, the
//!   [`sync::SyncExecutor`] that applies a plan, and the [`sync::SyncJob`]
//!   periodic scheduler.
//! - [`service`]: vault CRUD ([`service::ItemService`]) and the
//!   register/login orchestration ([`service::AuthFlow`]).
//!
//! The local database and the remote transport are external collaborators:
//! this crate only depends on them through the [`store::LocalStore`] and
//! [`adapter::ServerAdapter`] traits.

pub mod adapter;
pub mod config;
pub mod crypto;
pub mod model;
pub mod service;
pub mod store;
pub mod sync;

#[cfg(feature = "mock")]
pub mod testing;

pub use config::{KdfParams, VaultConfig};
pub use model::{
    BankCardData, BinaryData, CipheredPayload, ItemMetadata, LoginData, PayloadType, PlainData,
    PlainPayload, Session, StateDescriptor, UserCredentials, VaultItem,
};
