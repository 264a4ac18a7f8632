//! # Domain Entities
//!
//! Transient records that exist only for the duration of one `receive` call.

use std::fmt;

use shared_types::{IdentityId, PublicKey, Timestamp};

/// Transport-level input as delivered by the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEnvelope {
    /// Hex-encoded 32-byte public key of the sender
    pub sender_id_hex: String,
    /// Base64 of `nonce (24 bytes) || ciphertext || tag`
    pub payload: String,
}

impl RawEnvelope {
    pub fn new(sender_id_hex: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            sender_id_hex: sender_id_hex.into(),
            payload: payload.into(),
        }
    }
}

/// Sender descriptor carried inside the decrypted payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderInfo {
    pub display_name: String,
    /// Normalized (lowercase) hex form of `public_key`
    pub public_key_hex: String,
    pub public_key: PublicKey,
}

impl SenderInfo {
    pub fn new(display_name: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            display_name: display_name.into(),
            public_key_hex: hex::encode(public_key),
            public_key,
        }
    }

    /// Canonical identity id for this sender.
    pub fn identity_id(&self) -> IdentityId {
        IdentityId::from_public_key(&self.public_key)
    }
}

/// Message descriptor carried inside the decrypted payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageInfo {
    pub body: String,
    pub channel: String,
    pub thread: String,
    pub content_type: String,
    pub sent_at: Timestamp,
}

/// Fully validated payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingEnvelope {
    pub sender: SenderInfo,
    pub message: MessageInfo,
}

/// Pipeline stage an import failed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImportStage {
    /// Decoding the envelope's sender id
    SenderId,
    /// Opening the crypto box
    Decrypt,
    /// Parsing the plaintext
    Parse,
    /// Matching the payload sender against the envelope sender
    SenderBinding,
    /// Identity lookup/create/persist
    ResolveIdentity,
    /// Message record creation
    CreateMessage,
    /// Message persistence
    PersistMessage,
}

impl ImportStage {
    /// Stable snake_case label, used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SenderId => "sender_id",
            Self::Decrypt => "decrypt",
            Self::Parse => "parse",
            Self::SenderBinding => "sender_binding",
            Self::ResolveIdentity => "resolve_identity",
            Self::CreateMessage => "create_message",
            Self::PersistMessage => "persist_message",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
