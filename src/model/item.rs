use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of secret a [`VaultItem`] holds. Stored in clear (never
/// encrypted) on both the ciphered and plaintext payload forms, since the
/// sync planner and the server both need it without decrypting anything.
///
/// Serialises as the small integer enum the wire format calls for, via the
/// `TryFrom<u8>`/`From<u8>` pair below rather than serde's default
/// variant-name string, so a non-Rust server implementation only has to
/// agree on the discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PayloadType {
    LoginPassword,
    Text,
    BankCard,
    Binary,
}

impl From<PayloadType> for u8 {
    fn from(value: PayloadType) -> Self {
        match value {
            PayloadType::LoginPassword => 0,
            PayloadType::Text => 1,
            PayloadType::BankCard => 2,
            PayloadType::Binary => 3,
        }
    }
}

impl TryFrom<u8> for PayloadType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PayloadType::LoginPassword),
            1 => Ok(PayloadType::Text),
            2 => Ok(PayloadType::BankCard),
            3 => Ok(PayloadType::Binary),
            other => Err(format!("unknown payload type discriminant: {other}")),
        }
    }
}

/// Free-form, user-assigned label for an item. Always encrypted as part of
/// the `metadata` ciphered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginData {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankCardData {
    pub cardholder: String,
    pub number: String,
    pub brand: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinaryData {
    pub id: Uuid,
    pub file_name: String,
    pub size: u64,
    pub key_ref: String,
}

/// The `data` slot of a plaintext payload, chosen by [`PayloadType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlainData {
    Login(LoginData),
    Text(TextData),
    BankCard(BankCardData),
    Binary(BinaryData),
}

impl PlainData {
    pub fn payload_type(&self) -> PayloadType {
        match self {
            PlainData::Login(_) => PayloadType::LoginPassword,
            PlainData::Text(_) => PayloadType::Text,
            PlainData::BankCard(_) => PayloadType::BankCard,
            PlainData::Binary(_) => PayloadType::Binary,
        }
    }
}

/// A vault payload with every field except `type` in plaintext. Never
/// persisted or sent over the wire in this form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainPayload {
    pub metadata: ItemMetadata,
    #[serde(rename = "type")]
    pub payload_type: PayloadType,
    pub data: PlainData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_fields: Option<serde_json::Value>,
}

/// A vault payload with every field except `type` AEAD-sealed and
/// base64-encoded as `nonce ∥ ciphertext ∥ tag`. This is the only form the
/// server, the local store, and the sync planner ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipheredPayload {
    // canonical field order below matches the hash domain in
    // `crypto::payload_cipher::PayloadCipher::compute_hash`
    pub metadata: String,
    #[serde(rename = "type")]
    pub payload_type: PayloadType,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_fields: Option<String>,
}

/// A single secret in the vault: a login/password pair, a card, a note, or
/// a reference to an out-of-band binary blob.
///
/// `client_side_id` is the sole stable identity across client and server;
/// any server-side surrogate key is opaque to this crate and never
/// appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultItem {
    pub client_side_id: Uuid,
    pub user_id: i64,
    pub payload: CipheredPayload,
    pub hash: String,
    pub version: u64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VaultItem {
    /// The `{client_side_id, version, hash, deleted}` projection used by
    /// the sync planner. Never carries plaintext.
    pub fn state(&self) -> super::StateDescriptor {
        super::StateDescriptor {
            client_side_id: self.client_side_id,
            version: self.version,
            hash: self.hash.clone(),
            deleted: self.deleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_type_round_trips_through_its_wire_discriminant() {
        for ty in [
            PayloadType::LoginPassword,
            PayloadType::Text,
            PayloadType::BankCard,
            PayloadType::Binary,
        ] {
            let as_u8: u8 = ty.into();
            assert_eq!(PayloadType::try_from(as_u8).unwrap(), ty);
        }
        assert!(PayloadType::try_from(99).is_err());
    }

    #[test]
    fn ciphered_payload_serializes_type_as_an_integer() {
        let ciphered = CipheredPayload {
            metadata: "m".into(),
            payload_type: PayloadType::BankCard,
            data: "d".into(),
            notes: None,
            additional_fields: None,
        };
        let json = serde_json::to_value(&ciphered).unwrap();
        assert_eq!(json["type"], serde_json::json!(2));
        assert!(json.get("notes").is_none());
    }
}
