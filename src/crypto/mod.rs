//! The cryptographic key-chain and payload cipher (§4.1–4.2).

mod aead;
mod error;
mod keychain;
mod payload_cipher;

pub use error::{CryptoError, CryptoResult};
pub use keychain::{KeyChain, DEK_LEN, KEK_LEN, SALT_LEN};
pub use payload_cipher::PayloadCipher;
