//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits that define dependencies this subsystem needs.

use async_trait::async_trait;
use shared_types::{Identity, IdentityId, Message, NewIdentity, NewMessage, StoreError, Timestamp};

/// Identity persistence.
///
/// The store owns record lifetime; ingestion only reads and writes through
/// this interface.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by id. `Ok(None)` means not found.
    async fn find_identity(&self, id: &IdentityId) -> Result<Option<Identity>, StoreError>;

    /// Build a new identity record.
    ///
    /// # Errors
    /// * `StoreError::Conflict` - A record with the derived id already exists
    async fn create_identity(&self, fields: NewIdentity) -> Result<Identity, StoreError>;

    /// Write an identity durably.
    async fn persist_identity(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Remove an identity that was persisted by an import which then failed
    /// to persist its message. Only called for records that import created.
    /// Removing an absent id is not an error.
    async fn discard_identity(&self, id: &IdentityId) -> Result<(), StoreError>;
}

/// Message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Build a new message record with a store-assigned id.
    async fn create_message(&self, fields: NewMessage) -> Result<Message, StoreError>;

    /// Write a message durably.
    async fn persist_message(&self, message: &Message) -> Result<(), StoreError>;
}

/// Source of the local private key.
pub trait KeyProvider: Send + Sync {
    /// The local X25519 secret key bytes.
    fn local_private_key(&self) -> &[u8];
}

/// Wall clock.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}
