//! Inbound webhook event types.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Header carrying the HMAC signature of an inbound event.
pub const EVENT_SIGNATURE_HEADER: &str = "x-etvas-signature";

/// Header carrying the API key in API-key authentication mode.
pub const EVENT_API_KEY_HEADER: &str = "x-api-key";

/// A verified event: `{name, payload, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub name: String,

    #[serde(default)]
    pub payload: Value,

    /// Epoch milliseconds, as sent by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl EventEnvelope {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms as f64);
        self
    }
}

/// Raw inbound webhook request.
///
/// Header names are normalized to lowercase. The body is kept as received
/// because the signature covers the exact bytes.
///
/// # Examples
///
/// ```rust
/// use etvas_sdk::events::EventRequest;
/// use std::collections::HashMap;
///
/// let headers = HashMap::from([("X-Etvas-Signature".to_string(), "abc".to_string())]);
/// let request = EventRequest::new(headers, bytes::Bytes::from_static(b"{}"));
///
/// assert_eq!(request.header("x-etvas-signature"), Some("abc"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventRequest {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl EventRequest {
    pub fn new(headers: HashMap<String, String>, body: Bytes) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value))
            .collect();
        Self { headers, body }
    }

    /// Build a request from a JSON body, serialized compactly.
    pub fn from_json(headers: HashMap<String, String>, body: &Value) -> Self {
        Self::new(headers, Bytes::from(body.to_string()))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
