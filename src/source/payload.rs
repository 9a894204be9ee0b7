// Upstream body decoding: control-character sanitization and list-shape classification.

use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SessionsError};

/// Decode a response body as JSON.
///
/// Upstream occasionally embeds raw control characters inside string values,
/// which strict JSON rejects. On a first failure those bytes are stripped and
/// the decode is retried once.
pub fn parse_json(body: &[u8]) -> Result<Value> {
    match serde_json::from_slice(body) {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!("upstream body is not valid JSON, sanitizing: {}", first);
            let sanitized = strip_control_bytes(body);
            serde_json::from_slice(&sanitized)
                .map_err(|e| SessionsError::MalformedResponse(e.to_string()))
        }
    }
}

/// Remove 0x00-0x08, 0x0B, 0x0C and 0x0E-0x1F. Tab, LF and CR survive.
///
/// None of these bytes can occur inside a multi-byte UTF-8 sequence, so the
/// result stays valid UTF-8 when the input was.
pub fn strip_control_bytes(body: &[u8]) -> Vec<u8> {
    body.iter()
        .copied()
        .filter(|b| !matches!(b, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F))
        .collect()
}

/// Shape of a list endpoint's response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Top-level JSON array.
    Array(Vec<Value>),
    /// Object whose list field holds an array.
    Wrapped(Vec<Value>),
    /// Anything else. Treated as an empty list.
    Unrecognized,
}

impl Payload {
    /// Classify `value` for an endpoint whose wrapper object uses `field`.
    pub fn classify(value: Value, field: &str) -> Self {
        match value {
            Value::Array(items) => Payload::Array(items),
            Value::Object(mut map) => match map.remove(field) {
                Some(Value::Array(items)) => Payload::Wrapped(items),
                _ => Payload::Unrecognized,
            },
            _ => Payload::Unrecognized,
        }
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Payload::Array(items) | Payload::Wrapped(items) => items,
            Payload::Unrecognized => Vec::new(),
        }
    }
}
