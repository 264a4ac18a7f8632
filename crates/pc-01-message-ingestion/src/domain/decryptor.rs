//! # Decryptor
//!
//! Opens an envelope payload with the sender's public key and the local
//! private key. Pure function of its inputs.
//!
//! Input is base64 of `nonce (24) || ciphertext || tag (16)`. Either the
//! original plaintext comes back exactly, or an error does.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use shared_crypto::{BoxCipher, CryptoError, KEY_SIZE};
use shared_types::PublicKey;

use super::errors::{DecryptError, KeyRole};

/// Envelope opener bound to a cipher and a size limit.
#[derive(Clone, Debug)]
pub struct Decryptor {
    cipher: BoxCipher,
    max_envelope_bytes: usize,
}

impl Default for Decryptor {
    fn default() -> Self {
        Self::new(BoxCipher::default(), usize::MAX)
    }
}

impl Decryptor {
    pub fn new(cipher: BoxCipher, max_envelope_bytes: usize) -> Self {
        Self {
            cipher,
            max_envelope_bytes,
        }
    }

    /// Authenticate and decrypt `ciphertext_base64`.
    ///
    /// # Errors
    ///
    /// - `DecryptError::InvalidKey`: either key is not 32 bytes
    /// - `DecryptError::Decode`: bad base64, oversized payload, or fewer
    ///   bytes than nonce + tag
    /// - `DecryptError::Authentication`: tag verification failed
    pub fn decrypt(
        &self,
        ciphertext_base64: &str,
        sender_public_key: &[u8],
        recipient_private_key: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        check_key(sender_public_key, KeyRole::SenderPublic)?;
        check_key(recipient_private_key, KeyRole::RecipientPrivate)?;

        if ciphertext_base64.len() > self.max_envelope_bytes {
            return Err(DecryptError::Decode {
                field: "payload",
                reason: format!(
                    "{} bytes exceeds limit of {}",
                    ciphertext_base64.len(),
                    self.max_envelope_bytes
                ),
            });
        }

        let sealed = STANDARD
            .decode(ciphertext_base64)
            .map_err(|e| DecryptError::Decode {
                field: "payload",
                reason: e.to_string(),
            })?;

        shared_crypto::open(
            &sealed,
            sender_public_key,
            recipient_private_key,
            self.cipher,
        )
        .map_err(|e| match e {
            CryptoError::AuthenticationFailed => DecryptError::Authentication,
            CryptoError::InvalidKeyLength { actual, .. } => DecryptError::InvalidKey {
                role: KeyRole::RecipientPrivate,
                actual,
            },
            other => DecryptError::Decode {
                field: "payload",
                reason: other.to_string(),
            },
        })
    }
}

/// Decrypt with the default cipher and no size limit.
pub fn decrypt(
    ciphertext_base64: &str,
    sender_public_key: &[u8],
    recipient_private_key: &[u8],
) -> Result<Vec<u8>, DecryptError> {
    Decryptor::default().decrypt(ciphertext_base64, sender_public_key, recipient_private_key)
}

/// Decode the envelope's hex sender id into a public key.
///
/// # Errors
///
/// `DecryptError::Decode` for invalid hex, `DecryptError::InvalidKey` for a
/// decoded length other than 32.
pub fn decode_sender_id(sender_id_hex: &str) -> Result<PublicKey, DecryptError> {
    let bytes = hex::decode(sender_id_hex).map_err(|e| DecryptError::Decode {
        field: "sender_id",
        reason: e.to_string(),
    })?;

    PublicKey::try_from(bytes.as_slice()).map_err(|_| DecryptError::InvalidKey {
        role: KeyRole::SenderPublic,
        actual: bytes.len(),
    })
}

fn check_key(key: &[u8], role: KeyRole) -> Result<(), DecryptError> {
    if key.len() != KEY_SIZE {
        return Err(DecryptError::InvalidKey {
            role,
            actual: key.len(),
        });
    }
    Ok(())
}
