//! # PC-01: Message Ingestion Subsystem
//!
//! Turns an encrypted envelope delivered by the relay into a persisted chat
//! message attributed to a resolved sender identity.
//!
//! ## Pipeline
//!
//! ```text
//! RawEnvelope ──→ Decryptor ──→ plaintext ──→ PayloadParser ──→ (SenderInfo, MessageInfo)
//!                                                                   │
//!                                   IdentityResolver(SenderInfo) ←──┘
//!                                                                   │
//!                                        MessageStore ←── Message ──┘
//! ```
//!
//! Any stage failing short-circuits the import; no message is persisted
//! without a resolved sender. The identity and message writes happen last,
//! together, in a task the caller cannot cancel halfway; a failed message
//! write rolls the identity write back.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): envelope decryption, payload parsing, error taxonomy; no I/O
//! - **Ports** (`ports/`): `MessageIngestionApi` inbound; store, key and clock ports outbound
//! - **Application** (`application/`): identity upsert and the `receive` orchestration
//! - **Adapters** (`adapters/`): in-memory store, static key provider, system clock
//!
//! ## Concurrency
//!
//! Concurrent `receive` calls are allowed. Resolutions of the same identity
//! are serialized by a per-key async lock inside [`IdentityResolver`], held
//! until the import commits, so two first messages from one new sender
//! create a single identity.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::{FixedTimeSource, InMemoryStore, StaticKeyProvider, StoreOp, SystemTimeSource};
pub use application::identity_resolver::{IdentityResolver, PendingIdentity};
pub use application::service::MessageIngestionService;
pub use config::IngestionConfig;
pub use domain::decryptor::{decode_sender_id, decrypt, Decryptor};
pub use domain::entities::{ImportStage, IncomingEnvelope, MessageInfo, RawEnvelope, SenderInfo};
pub use domain::errors::{DecryptError, ImportError, ImportErrorKind, KeyRole, ParseError};
pub use domain::parser::{parse, JsonPayloadCodec, PayloadCodec};
pub use ports::inbound::MessageIngestionApi;
pub use ports::outbound::{IdentityStore, KeyProvider, MessageStore, TimeSource};
