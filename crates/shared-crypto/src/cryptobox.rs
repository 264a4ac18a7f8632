//! # Crypto Box
//!
//! Public-key authenticated encryption between two X25519 key pairs.
//!
//! A shared key is derived from one side's secret key and the other side's
//! public key; the payload is then encrypted and authenticated with a
//! 24-byte-nonce stream cipher and Poly1305.
//!
//! ## Security Properties
//!
//! - **XSalsa20-Poly1305**: NaCl `crypto_box`, interoperable with tweetnacl
//! - **XChaCha20-Poly1305**: same construction with the ChaCha20 core
//! - Both use 192-bit random nonces, safe to generate per message

use std::str::FromStr;

use crypto_box::aead::{Aead, AeadCore, Nonce as AeadNonce, OsRng};
use crypto_box::{ChaChaBox, PublicKey, SalsaBox, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::CryptoError;

/// X25519 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Nonce size in bytes (both ciphers).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Smallest possible sealed box: nonce plus tag of an empty plaintext.
pub const MIN_SEALED_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// X25519 secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct BoxSecretKey([u8; KEY_SIZE]);

impl BoxSecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` unless `bytes` is 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self(key_array(bytes)?))
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> [u8; KEY_SIZE] {
        *self.to_box_key().public_key().as_bytes()
    }

    fn to_box_key(&self) -> SecretKey {
        SecretKey::from(self.0)
    }
}

impl std::fmt::Debug for BoxSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoxSecretKey(..)")
    }
}

/// An X25519 key pair for sealing and opening boxes.
#[derive(Clone, Debug)]
pub struct BoxKeyPair {
    /// Public half, shared with correspondents.
    pub public_key: [u8; KEY_SIZE],
    /// Secret half.
    pub secret_key: BoxSecretKey,
}

impl BoxKeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        Self::from_secret(BoxSecretKey::generate())
    }

    /// Build the pair for an existing secret key.
    pub fn from_secret(secret_key: BoxSecretKey) -> Self {
        Self {
            public_key: secret_key.public_key(),
            secret_key,
        }
    }
}

/// Cipher selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxCipher {
    /// XSalsa20-Poly1305 (default, NaCl compatible)
    #[default]
    XSalsa20Poly1305,
    /// XChaCha20-Poly1305
    XChaCha20Poly1305,
}

impl FromStr for BoxCipher {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xsalsa20poly1305" | "salsa" | "nacl" => Ok(Self::XSalsa20Poly1305),
            "xchacha20poly1305" | "chacha" => Ok(Self::XChaCha20Poly1305),
            other => Err(CryptoError::UnknownCipher(other.to_string())),
        }
    }
}

/// Seal `plaintext` for `recipient_public_key` as `sender_secret_key`.
///
/// Returns `nonce || ciphertext || tag` with a freshly generated nonce.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyLength` for keys that are not 32 bytes and
/// `CryptoError::EncryptionFailed` if the cipher rejects the input.
pub fn seal(
    plaintext: &[u8],
    recipient_public_key: &[u8],
    sender_secret_key: &[u8],
    cipher: BoxCipher,
) -> Result<Vec<u8>, CryptoError> {
    let public_key = PublicKey::from(key_array(recipient_public_key)?);
    let secret_key = BoxSecretKey::from_slice(sender_secret_key)?.to_box_key();

    match cipher {
        BoxCipher::XSalsa20Poly1305 => {
            seal_with(&SalsaBox::new(&public_key, &secret_key), plaintext)
        }
        BoxCipher::XChaCha20Poly1305 => {
            seal_with(&ChaChaBox::new(&public_key, &secret_key), plaintext)
        }
    }
}

/// Open a sealed box from `sender_public_key` with `recipient_secret_key`.
///
/// Plaintext is returned only if the tag verifies; there is no partial
/// output.
///
/// # Errors
///
/// - `CryptoError::InvalidKeyLength`: a key is not 32 bytes
/// - `CryptoError::CiphertextTooShort`: `sealed` is shorter than nonce + tag
/// - `CryptoError::AuthenticationFailed`: wrong key or modified ciphertext
pub fn open(
    sealed: &[u8],
    sender_public_key: &[u8],
    recipient_secret_key: &[u8],
    cipher: BoxCipher,
) -> Result<Vec<u8>, CryptoError> {
    let public_key = PublicKey::from(key_array(sender_public_key)?);
    let secret_key = BoxSecretKey::from_slice(recipient_secret_key)?.to_box_key();

    if sealed.len() < MIN_SEALED_LEN {
        return Err(CryptoError::CiphertextTooShort {
            minimum: MIN_SEALED_LEN,
            actual: sealed.len(),
        });
    }

    match cipher {
        BoxCipher::XSalsa20Poly1305 => open_with(&SalsaBox::new(&public_key, &secret_key), sealed),
        BoxCipher::XChaCha20Poly1305 => {
            open_with(&ChaChaBox::new(&public_key, &secret_key), sealed)
        }
    }
}

fn seal_with<A: Aead + AeadCore>(aead: &A, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce = A::generate_nonce(&mut OsRng);
    let ciphertext = aead
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut sealed = Vec::with_capacity(nonce.len() + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

fn open_with<A: Aead>(aead: &A, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    aead.decrypt(AeadNonce::<A>::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

fn key_array(bytes: &[u8]) -> Result<[u8; KEY_SIZE], CryptoError> {
    <[u8; KEY_SIZE]>::try_from(bytes).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: bytes.len(),
    })
}
