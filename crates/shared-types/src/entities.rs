//! # Core Domain Entities
//!
//! Records owned by the persistence collaborator and produced or updated by
//! the ingestion pipeline.
//!
//! ## Clusters
//!
//! - **Keys**: `PublicKey`, `IdentityId`
//! - **Correspondents**: `Identity`, `NewIdentity`
//! - **Conversation**: `Message`, `NewMessage`, `MessageId`

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// KEYS
// =============================================================================

/// Length in bytes of a correspondent's public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// A 32-byte X25519 public key.
pub type PublicKey = [u8; PUBLIC_KEY_LEN];

/// Wall-clock instant, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Canonical identifier of a correspondent.
///
/// Always the lowercase hex encoding of the correspondent's public key, so
/// two records for the same key can never carry different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Derive the id for a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(hex::encode(public_key))
    }

    /// Full hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CORRESPONDENTS
// =============================================================================

/// A known correspondent.
///
/// Created on the first message from an unknown key; afterwards only the
/// display name changes (last seen name wins). Never deleted by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Derived from `public_key`; stable for the life of the record.
    pub id: IdentityId,
    /// The correspondent's public key.
    #[serde(with = "hex::serde")]
    pub public_key: PublicKey,
    /// Last display name the correspondent announced.
    pub display_name: String,
}

impl Identity {
    /// Build a record for `public_key`, deriving its id.
    pub fn new(public_key: PublicKey, display_name: impl Into<String>) -> Self {
        Self {
            id: IdentityId::from_public_key(&public_key),
            public_key,
            display_name: display_name.into(),
        }
    }

    /// Replace the display name. Returns true if it changed.
    pub fn rename(&mut self, display_name: &str) -> bool {
        if self.display_name == display_name {
            return false;
        }
        self.display_name = display_name.to_string();
        true
    }
}

/// Fields for creating an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub public_key: PublicKey,
    pub display_name: String,
}

impl NewIdentity {
    /// The id the created record will carry.
    pub fn id(&self) -> IdentityId {
        IdentityId::from_public_key(&self.public_key)
    }
}

impl From<NewIdentity> for Identity {
    fn from(fields: NewIdentity) -> Self {
        Identity::new(fields.public_key, fields.display_name)
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// Store-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One received chat message.
///
/// Created exactly once per successful import and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    /// Identity the message was attributed to.
    pub sender_id: IdentityId,
    /// Sender display name at the time of receipt (denormalized snapshot).
    pub from: String,
    /// Sender-declared send time.
    pub sent_at: Timestamp,
    /// Local processing time, set once.
    pub received_at: Timestamp,
    pub body: String,
    pub channel: String,
    pub thread: String,
    pub content_type: String,
}

/// Fields for creating a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: IdentityId,
    pub from: String,
    pub sent_at: Timestamp,
    pub received_at: Timestamp,
    pub body: String,
    pub channel: String,
    pub thread: String,
    pub content_type: String,
}

impl NewMessage {
    /// Attach a store-assigned id.
    pub fn into_message(self, id: MessageId) -> Message {
        Message {
            id,
            sender_id: self.sender_id,
            from: self.from,
            sent_at: self.sent_at,
            received_at: self.received_at,
            body: self.body,
            channel: self.channel,
            thread: self.thread,
            content_type: self.content_type,
        }
    }
}
