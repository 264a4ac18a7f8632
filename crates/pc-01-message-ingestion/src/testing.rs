//! Envelope fixtures for tests.
//!
//! Builds payloads the way a remote peer would: JSON, sealed to the local
//! key, base64 encoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use shared_crypto::{seal, BoxCipher, BoxKeyPair};

use crate::domain::entities::RawEnvelope;

/// Send time used by [`payload`].
pub const SENT_AT: i64 = 1_690_000_000;

/// A complete payload from `sender` announcing `name`.
pub fn payload(sender: &BoxKeyPair, name: &str, body: &str) -> Value {
    json!({
        "message": {
            "body": body,
            "channel": "general",
            "thread": "t1",
            "contentType": "text"
        },
        "time_sent": SENT_AT,
        "sender": { "name": name, "uid": hex::encode(sender.public_key) }
    })
}

/// Seal `plaintext` from `sender` to `recipient_public_key`.
pub fn sealed_envelope(
    plaintext: &[u8],
    sender: &BoxKeyPair,
    recipient_public_key: &[u8; 32],
    cipher: BoxCipher,
) -> RawEnvelope {
    let sealed = seal(
        plaintext,
        recipient_public_key,
        sender.secret_key.as_bytes(),
        cipher,
    )
    .expect("32-byte keys always seal");

    RawEnvelope::new(hex::encode(sender.public_key), STANDARD.encode(sealed))
}

/// Serialize and seal a JSON payload with the default cipher.
pub fn envelope(
    payload: &Value,
    sender: &BoxKeyPair,
    recipient_public_key: &[u8; 32],
) -> RawEnvelope {
    sealed_envelope(
        payload.to_string().as_bytes(),
        sender,
        recipient_public_key,
        BoxCipher::default(),
    )
}

/// Flip one bit in the last byte of the sealed payload (the tag).
pub fn corrupt_tag(envelope: &RawEnvelope) -> RawEnvelope {
    let mut sealed = STANDARD
        .decode(&envelope.payload)
        .expect("fixture payload is base64");
    if let Some(last) = sealed.last_mut() {
        *last ^= 0x01;
    }
    RawEnvelope::new(envelope.sender_id_hex.clone(), STANDARD.encode(sealed))
}
