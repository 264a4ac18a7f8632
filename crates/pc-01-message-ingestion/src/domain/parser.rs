//! # Payload Parser
//!
//! Turns decrypted plaintext into an [`IncomingEnvelope`].
//!
//! ## Payload Shape
//!
//! ```json
//! {
//!   "message":   { "body": "hi", "channel": "general", "thread": "t1", "contentType": "text" },
//!   "time_sent": 1690000000,
//!   "sender":    { "name": "Alice", "uid": "<64 hex chars>" }
//! }
//! ```
//!
//! Every field is required. Absent and `null` are both reported as
//! `MissingField`; nothing is defaulted. A field of the wrong JSON type is
//! `Malformed`. Unknown fields are ignored.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{PublicKey, Timestamp};

use super::entities::{IncomingEnvelope, MessageInfo, SenderInfo};
use super::errors::ParseError;

/// Epoch values at or above this magnitude are milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// Wire model. Every field is optional here so that absence is reported
// per field instead of as a generic deserialization error.

#[derive(Deserialize)]
struct WirePayload {
    message: Option<WireMessage>,
    // Epoch number or date string, resolved by `timestamp`.
    time_sent: Option<Value>,
    sender: Option<WireSender>,
}

#[derive(Deserialize)]
struct WireMessage {
    body: Option<String>,
    channel: Option<String>,
    thread: Option<String>,
    #[serde(rename = "contentType")]
    content_type: Option<String>,
}

#[derive(Deserialize)]
struct WireSender {
    name: Option<String>,
    uid: Option<String>,
}

/// Decodes plaintext into a validated envelope.
///
/// Implementations must reject partial structures rather than fill in
/// defaults.
pub trait PayloadCodec: Send + Sync {
    /// Decode and validate one plaintext.
    fn decode(&self, plaintext: &[u8]) -> Result<IncomingEnvelope, ParseError>;
}

/// JSON payload codec.
#[derive(Clone, Debug)]
pub struct JsonPayloadCodec {
    max_plaintext_bytes: usize,
}

impl Default for JsonPayloadCodec {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl JsonPayloadCodec {
    pub fn new(max_plaintext_bytes: usize) -> Self {
        Self {
            max_plaintext_bytes,
        }
    }
}

impl PayloadCodec for JsonPayloadCodec {
    fn decode(&self, plaintext: &[u8]) -> Result<IncomingEnvelope, ParseError> {
        if plaintext.len() > self.max_plaintext_bytes {
            return Err(ParseError::TooLarge {
                size: plaintext.len(),
                max: self.max_plaintext_bytes,
            });
        }

        let text = std::str::from_utf8(plaintext).map_err(|_| ParseError::NotUtf8)?;
        let wire: WirePayload =
            serde_json::from_str(text).map_err(|e| ParseError::Malformed(e.to_string()))?;

        let message = present(wire.message, "message")?;
        let message = MessageInfo {
            body: present(message.body, "message.body")?,
            channel: present(message.channel, "message.channel")?,
            thread: present(message.thread, "message.thread")?,
            content_type: present(message.content_type, "message.contentType")?,
            sent_at: timestamp(&present(wire.time_sent, "time_sent")?)?,
        };

        let sender = present(wire.sender, "sender")?;
        let display_name = present(sender.name, "sender.name")?;
        let public_key = public_key(&present(sender.uid, "sender.uid")?)?;

        Ok(IncomingEnvelope {
            sender: SenderInfo::new(display_name, public_key),
            message,
        })
    }
}

/// Parse `plaintext` with the default JSON codec.
pub fn parse(plaintext: &[u8]) -> Result<IncomingEnvelope, ParseError> {
    JsonPayloadCodec::default().decode(plaintext)
}

fn present<T>(value: Option<T>, field: &'static str) -> Result<T, ParseError> {
    value.ok_or(ParseError::MissingField(field))
}

fn public_key(uid: &str) -> Result<PublicKey, ParseError> {
    let bytes = hex::decode(uid).map_err(|_| ParseError::InvalidEncoding("sender.uid"))?;
    PublicKey::try_from(bytes.as_slice()).map_err(|_| ParseError::InvalidEncoding("sender.uid"))
}

fn timestamp(value: &Value) -> Result<Timestamp, ParseError> {
    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(epoch) => from_epoch(epoch),
            None => n.as_f64().and_then(from_epoch_float),
        },
        Value::String(s) => from_text(s.trim()),
        // null never reaches here; it deserializes as an absent field
        _ => return Err(invalid("time_sent", "expected a string or number")),
    };
    parsed.ok_or_else(|| invalid("time_sent", format!("unrecognized timestamp {value}")))
}

fn from_epoch(epoch: i64) -> Option<Timestamp> {
    if epoch.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD as u64 {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}

fn from_epoch_float(epoch: f64) -> Option<Timestamp> {
    if !epoch.is_finite() {
        return None;
    }
    let millis = if epoch.abs() >= EPOCH_MILLIS_THRESHOLD as f64 {
        epoch.round()
    } else {
        (epoch * 1000.0).round()
    };
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

fn from_text(text: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidField {
        field,
        reason: reason.into(),
    }
}
