//! # Ingestion Errors
//!
//! Every stage returns a typed error; `ImportError` wraps them with the
//! stage they came from.

use std::fmt;

use shared_types::{IdentityId, StoreError};
use thiserror::Error;

use super::entities::ImportStage;

/// Which key failed a length check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    SenderPublic,
    RecipientPrivate,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SenderPublic => f.write_str("sender public key"),
            Self::RecipientPrivate => f.write_str("recipient private key"),
        }
    }
}

/// Errors from opening an envelope.
///
/// All are terminal for the message; none can succeed on retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecryptError {
    /// Malformed base64/hex, oversized or truncated input
    #[error("Malformed {field}: {reason}")]
    Decode { field: &'static str, reason: String },

    /// Key is not 32 bytes
    #[error("Invalid {role} length: expected 32, got {actual}")]
    InvalidKey { role: KeyRole, actual: usize },

    /// Tag verification failed (wrong key, corrupted or forged ciphertext)
    #[error("Authentication failed")]
    Authentication,
}

/// Errors from parsing a decrypted payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Payload is not valid UTF-8")]
    NotUtf8,

    /// Not a well-formed document of the expected structure
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// A required field is absent or null
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A key field is not valid hex of the right length
    #[error("Invalid encoding in field: {0}")]
    InvalidEncoding(&'static str),

    /// A field is present but has the wrong shape
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Payload too large: {size} > {max} bytes")]
    TooLarge { size: usize, max: usize },
}

/// Coarse classification of an [`ImportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    Decode,
    InvalidKey,
    Authentication,
    Parse,
    Store,
}

/// Failure of one `receive` call.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{stage} failed: {source}")]
    Decrypt {
        stage: ImportStage,
        #[source]
        source: DecryptError,
    },

    #[error("parse failed: {0}")]
    Parse(#[source] ParseError),

    /// Payload names a different sender than the key that sealed it
    #[error(
        "sender_binding failed: payload claims {}.., envelope sealed by {}..",
        .claimed.short(),
        .authenticated.short()
    )]
    SenderMismatch {
        claimed: IdentityId,
        authenticated: IdentityId,
    },

    #[error("{stage} failed: {source}")]
    Store {
        stage: ImportStage,
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    /// Stage the import stopped at.
    pub fn stage(&self) -> ImportStage {
        match self {
            Self::Decrypt { stage, .. } | Self::Store { stage, .. } => *stage,
            Self::Parse(_) => ImportStage::Parse,
            Self::SenderMismatch { .. } => ImportStage::SenderBinding,
        }
    }

    pub fn kind(&self) -> ImportErrorKind {
        match self {
            Self::Decrypt { source, .. } => match source {
                DecryptError::Decode { .. } => ImportErrorKind::Decode,
                DecryptError::InvalidKey { .. } => ImportErrorKind::InvalidKey,
                DecryptError::Authentication => ImportErrorKind::Authentication,
            },
            Self::Parse(_) => ImportErrorKind::Parse,
            Self::SenderMismatch { .. } => ImportErrorKind::Authentication,
            Self::Store { .. } => ImportErrorKind::Store,
        }
    }
}
