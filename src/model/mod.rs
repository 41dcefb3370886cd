//! Vault domain types shared by the crypto, service, and sync subsystems.

mod item;
mod session;
mod state;
mod user;

pub use item::{
    BankCardData, BinaryData, CipheredPayload, ItemMetadata, LoginData, PayloadType, PlainData,
    PlainPayload, TextData, VaultItem,
};
pub use session::Session;
pub use state::StateDescriptor;
pub use user::UserCredentials;
