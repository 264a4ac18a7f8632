//! Configuration for the Message Ingestion Subsystem

use std::env;

use serde::{Deserialize, Serialize};
use shared_crypto::BoxCipher;

/// Ingestion configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Largest accepted base64 payload, checked before decoding
    pub max_envelope_bytes: usize,
    /// Largest accepted plaintext, checked before parsing
    pub max_plaintext_bytes: usize,
    /// Require `sender.uid` to equal the envelope's authenticated sender key
    pub enforce_sender_binding: bool,
    /// Crypto-box construction used to open envelopes
    pub cipher: BoxCipher,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_envelope_bytes: 256 * 1024,
            max_plaintext_bytes: 192 * 1024,
            enforce_sender_binding: true,
            cipher: BoxCipher::XSalsa20Poly1305,
        }
    }
}

impl IngestionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PARLEY_MAX_ENVELOPE_BYTES` (default: 262144)
    /// - `PARLEY_MAX_PLAINTEXT_BYTES` (default: 196608)
    /// - `PARLEY_ENFORCE_SENDER_BINDING` (default: true)
    /// - `PARLEY_CIPHER`: `xsalsa20poly1305` or `xchacha20poly1305`
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_envelope_bytes: env::var("PARLEY_MAX_ENVELOPE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_envelope_bytes),

            max_plaintext_bytes: env::var("PARLEY_MAX_PLAINTEXT_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_plaintext_bytes),

            enforce_sender_binding: env::var("PARLEY_ENFORCE_SENDER_BINDING")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enforce_sender_binding),

            cipher: env::var("PARLEY_CIPHER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cipher),
        }
    }
}
