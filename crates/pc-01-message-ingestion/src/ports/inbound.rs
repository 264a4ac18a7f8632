//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use async_trait::async_trait;
use shared_types::Message;

use crate::domain::entities::RawEnvelope;
use crate::domain::errors::ImportError;

/// Primary Message Ingestion API.
///
/// Implementations must be thread-safe (`Send + Sync`); concurrent calls
/// for distinct envelopes are allowed.
#[async_trait]
pub trait MessageIngestionApi: Send + Sync {
    /// Decrypt, parse and import one envelope.
    ///
    /// Returns the persisted message. On error nothing is persisted for this
    /// envelope except, possibly, an identity whose name was refreshed before
    /// message persistence failed.
    ///
    /// # Errors
    /// * `ImportError::Decrypt` - Bad sender id, undecodable or unauthentic payload
    /// * `ImportError::Parse` - Plaintext is not a complete payload
    /// * `ImportError::SenderMismatch` - Payload names a sender other than the sealer
    /// * `ImportError::Store` - Persistence collaborator failed
    async fn receive(&self, envelope: RawEnvelope) -> Result<Message, ImportError>;
}
