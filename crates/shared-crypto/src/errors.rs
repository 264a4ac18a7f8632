//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Tag verification failed: wrong key, corrupted or forged ciphertext
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Sealed box shorter than nonce + tag
    #[error("Ciphertext too short: need at least {minimum} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum sealed length in bytes
        minimum: usize,
        /// Actual sealed length in bytes
        actual: usize,
    },

    /// Unknown cipher name
    #[error("Unknown cipher: {0}")]
    UnknownCipher(String),
}
