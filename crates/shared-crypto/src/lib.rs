//! # Shared Crypto - Public-Key Authenticated Encryption
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `cryptobox` | X25519 + XSalsa20-Poly1305 / XChaCha20-Poly1305 | Envelope sealing and opening |
//!
//! ## Wire Format
//!
//! A sealed box is `nonce (24 bytes) || ciphertext || tag (16 bytes)`, the
//! layout produced by NaCl `crypto_box` and tweetnacl's `box`.
//!
//! ## Security Properties
//!
//! - **Tamper-evident**: any modified byte fails Poly1305 verification
//! - **All-or-nothing**: plaintext is returned only after the tag verifies
//! - **Key hygiene**: secret keys are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cryptobox;
pub mod errors;

// Re-exports
pub use cryptobox::{
    open, seal, BoxCipher, BoxKeyPair, BoxSecretKey, KEY_SIZE, MIN_SEALED_LEN, NONCE_SIZE,
    TAG_SIZE,
};
pub use errors::CryptoError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
