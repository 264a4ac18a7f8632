//! Message Ingestion Service
//!
//! Main service implementing `MessageIngestionApi`.

use std::sync::Arc;

use async_trait::async_trait;
use parley_telemetry::{
    record_failure, time_histogram, ENVELOPES_RECEIVED, MESSAGES_IMPORTED, RECEIVE_DURATION,
};
use shared_types::{IdentityId, Message, NewMessage, StoreError};
use tracing::{debug, info, instrument, warn, Instrument, Span};
use zeroize::Zeroizing;

use super::identity_resolver::{IdentityResolver, PendingIdentity};
use crate::adapters::SystemTimeSource;
use crate::config::IngestionConfig;
use crate::domain::decryptor::{decode_sender_id, Decryptor};
use crate::domain::entities::{ImportStage, RawEnvelope};
use crate::domain::errors::ImportError;
use crate::domain::parser::{JsonPayloadCodec, PayloadCodec};
use crate::ports::inbound::MessageIngestionApi;
use crate::ports::outbound::{IdentityStore, KeyProvider, MessageStore, TimeSource};

/// Message Ingestion Service
///
/// Orchestrates the import pipeline:
/// 1. Decode the envelope's sender id
/// 2. Decrypt the payload with the local private key
/// 3. Parse the plaintext
/// 4. Check the payload sender against the sealing key
/// 5. Resolve the sender identity, without writing it
/// 6. Create the message record
/// 7. Persist the identity, then the message
///
/// Step 7 runs in its own task and always completes once started, even if
/// the caller stops waiting. If the message cannot be persisted the
/// identity write is rolled back, so a call either stores a message (with
/// its identity change) or leaves the store as it found it.
pub struct MessageIngestionService<I: ?Sized, M: ?Sized> {
    config: IngestionConfig,
    decryptor: Decryptor,
    codec: Arc<dyn PayloadCodec>,
    resolver: IdentityResolver<I>,
    messages: Arc<M>,
    keys: Arc<dyn KeyProvider>,
    clock: Arc<dyn TimeSource>,
}

impl<I, M> MessageIngestionService<I, M>
where
    I: IdentityStore + ?Sized + 'static,
    M: MessageStore + ?Sized + 'static,
{
    /// Create a new service with default config
    pub fn new(identities: Arc<I>, messages: Arc<M>, keys: Arc<dyn KeyProvider>) -> Self {
        Self::with_config(identities, messages, keys, IngestionConfig::default())
    }

    /// Create a new service with custom config
    pub fn with_config(
        identities: Arc<I>,
        messages: Arc<M>,
        keys: Arc<dyn KeyProvider>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            decryptor: Decryptor::new(config.cipher, config.max_envelope_bytes),
            codec: Arc::new(JsonPayloadCodec::new(config.max_plaintext_bytes)),
            resolver: IdentityResolver::new(identities),
            messages,
            keys,
            clock: Arc::new(SystemTimeSource),
            config,
        }
    }

    /// Replace the clock that stamps `received_at`.
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the payload codec.
    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    #[instrument(
        name = "receive",
        skip(self, envelope),
        fields(sender = %short_hex(&envelope.sender_id_hex))
    )]
    async fn import(&self, envelope: RawEnvelope) -> Result<Message, ImportError> {
        // 1. Sender id
        let sender_key =
            decode_sender_id(&envelope.sender_id_hex).map_err(|source| ImportError::Decrypt {
                stage: ImportStage::SenderId,
                source,
            })?;

        // 2. Decrypt
        let plaintext = Zeroizing::new(
            self.decryptor
                .decrypt(&envelope.payload, &sender_key, self.keys.local_private_key())
                .map_err(|source| ImportError::Decrypt {
                    stage: ImportStage::Decrypt,
                    source,
                })?,
        );

        // 3. Parse
        let incoming = self.codec.decode(&plaintext).map_err(ImportError::Parse)?;
        drop(plaintext);

        // 4. Sender binding
        if self.config.enforce_sender_binding && incoming.sender.public_key != sender_key {
            return Err(ImportError::SenderMismatch {
                claimed: incoming.sender.identity_id(),
                authenticated: IdentityId::from_public_key(&sender_key),
            });
        }

        // 5. Resolve identity
        let pending = self
            .resolver
            .prepare(&incoming.sender)
            .await
            .map_err(|source| ImportError::Store {
                stage: ImportStage::ResolveIdentity,
                source,
            })?;

        // 6. Create message
        let identity = pending.identity();
        let message = incoming.message;
        let fields = NewMessage {
            sender_id: identity.id.clone(),
            from: identity.display_name.clone(),
            sent_at: message.sent_at,
            received_at: self.clock.now(),
            body: message.body,
            channel: message.channel,
            thread: message.thread,
            content_type: message.content_type,
        };

        let message = self
            .messages
            .create_message(fields)
            .await
            .map_err(|source| ImportError::Store {
                stage: ImportStage::CreateMessage,
                source,
            })?;
        debug!(message_id = %message.id, "Created message record");

        // 7. Commit
        let task = commit(pending, Arc::clone(&self.messages), message);
        match tokio::spawn(task.instrument(Span::current())).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(ImportError::Store {
                stage: ImportStage::PersistMessage,
                source: StoreError::Unavailable(e.to_string()),
            }),
        }
    }
}

/// Persist the identity and then the message, rolling the identity back if
/// the message write fails. Holds the sender's key lock throughout.
async fn commit<I, M>(
    pending: PendingIdentity<I>,
    messages: Arc<M>,
    message: Message,
) -> Result<Message, ImportError>
where
    I: IdentityStore + ?Sized,
    M: MessageStore + ?Sized,
{
    pending
        .persist()
        .await
        .map_err(|source| ImportError::Store {
            stage: ImportStage::ResolveIdentity,
            source,
        })?;

    if let Err(source) = messages.persist_message(&message).await {
        pending.rollback().await;
        return Err(ImportError::Store {
            stage: ImportStage::PersistMessage,
            source,
        });
    }

    pending.finish();
    Ok(message)
}

#[async_trait]
impl<I, M> MessageIngestionApi for MessageIngestionService<I, M>
where
    I: IdentityStore + ?Sized + 'static,
    M: MessageStore + ?Sized + 'static,
{
    async fn receive(&self, envelope: RawEnvelope) -> Result<Message, ImportError> {
        ENVELOPES_RECEIVED.inc();
        let _timer = time_histogram!(RECEIVE_DURATION);

        match self.import(envelope).await {
            Ok(message) => {
                MESSAGES_IMPORTED.inc();
                info!(
                    message_id = %message.id,
                    identity_id = %message.sender_id.short(),
                    channel = %message.channel,
                    "Imported message"
                );
                Ok(message)
            }
            Err(e) => {
                let stage = e.stage();
                record_failure(stage.as_str());
                warn!(stage = %stage, kind = ?e.kind(), error = %e, "Dropped envelope");
                Err(e)
            }
        }
    }
}

fn short_hex(hex: &str) -> &str {
    hex.get(..8).unwrap_or(hex)
}
