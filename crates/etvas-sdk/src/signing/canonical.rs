//! Request canonicalization.
//!
//! A request is reduced to a newline-joined attribute list in a fixed order:
//!
//! ```text
//! METHOD
//! path
//! [query]
//! [content-type:<type>]
//! x-api-key:<key>
//! [x-etvas-context:<context>]
//! x-timestamp:<unix seconds>
//! <sha256 hex of body>
//! ```
//!
//! Bracketed attributes are omitted when empty. The platform rebuilds the
//! same string to verify the signature, so ordering and omission rules are
//! part of the wire contract.

use std::fmt;

use chrono::Utc;

use super::hmac::{sha256_hex, sign, SignOptions};
use super::query::encode_params;
use crate::error::SigningError;
use crate::request::OutboundRequest;

/// Header carrying the caller correlation context.
pub const CONTEXT_HEADER: &str = "x-etvas-context";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the request timestamp in Unix seconds.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header carrying the outbound request signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

const CONTENT_TYPE_HEADER: &str = "content-type";

/// Canonical form of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub api_key: String,
    pub context: Option<String>,
    pub timestamp: i64,
    /// The exact body text that was hashed.
    pub body: Option<String>,
    pub body_hash: String,
}

impl CanonicalRequest {
    /// Canonicalize a request.
    ///
    /// Explicit query parameters take precedence over a query embedded in the
    /// URL. When `timestamp` is `None` the current Unix time is used.
    pub fn from_request(request: &OutboundRequest, api_key: &str, timestamp: Option<i64>) -> Self {
        let body = request.body_text().filter(|text| !text.is_empty());
        let body_hash = sha256_hex(body.as_deref());

        let (path, query) = split_path_and_query(request);

        Self {
            method: request.method.as_str().to_uppercase(),
            path,
            query,
            content_type: non_empty(request.header(CONTENT_TYPE_HEADER)),
            api_key: api_key.to_string(),
            context: non_empty(request.header(CONTEXT_HEADER)),
            timestamp: timestamp.unwrap_or_else(|| Utc::now().timestamp()),
            body,
            body_hash,
        }
    }

    /// Ordered attribute list, skipping empty optional entries.
    pub fn attributes(&self) -> Vec<String> {
        let mut attributes = vec![self.method.clone(), self.path.clone()];
        if let Some(query) = &self.query {
            attributes.push(query.clone());
        }
        if let Some(content_type) = &self.content_type {
            attributes.push(format!("{}:{}", CONTENT_TYPE_HEADER, content_type));
        }
        attributes.push(format!("{}:{}", API_KEY_HEADER, self.api_key));
        if let Some(context) = &self.context {
            attributes.push(format!("{}:{}", CONTEXT_HEADER, context));
        }
        attributes.push(format!("{}:{}", TIMESTAMP_HEADER, self.timestamp));
        attributes.push(self.body_hash.clone());
        attributes
    }

    /// The string that gets signed.
    pub fn to_canonical_string(&self) -> String {
        self.attributes().join("\n")
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

/// Signature material for one outbound request.
#[derive(Clone, PartialEq, Eq)]
pub struct PreparedSignature {
    pub signature: String,
    pub timestamp: i64,
    /// Body text to send in place of the original body.
    pub canonical_body: Option<String>,
}

impl fmt::Debug for PreparedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedSignature")
            .field("signature", &"<REDACTED>")
            .field("timestamp", &self.timestamp)
            .field("canonical_body", &self.canonical_body)
            .finish()
    }
}

/// Canonicalize a request and sign it with HMAC-SHA256 (hex).
///
/// # Arguments
///
/// * `request` - The outbound request
/// * `api_key` - API key sent in `x-api-key`
/// * `secret` - Request signing secret
/// * `forced_timestamp` - Fixed timestamp, mostly for deterministic tests
///
/// # Errors
///
/// Returns `SigningError::InvalidKey` if `secret` is empty.
pub fn prepare_signature(
    request: &OutboundRequest,
    api_key: &str,
    secret: &str,
    forced_timestamp: Option<i64>,
) -> Result<PreparedSignature, SigningError> {
    let canonical = CanonicalRequest::from_request(request, api_key, forced_timestamp);
    let signature = sign(&canonical.to_canonical_string(), secret, SignOptions::default())?;

    Ok(PreparedSignature {
        signature: signature.to_hex(),
        timestamp: canonical.timestamp,
        canonical_body: canonical.body,
    })
}

fn split_path_and_query(request: &OutboundRequest) -> (String, Option<String>) {
    let explicit = encode_params(&request.params);
    if !explicit.is_empty() {
        return (request.url.clone(), Some(explicit));
    }

    let mut parts = request.url.split('?');
    let path = parts.next().unwrap_or_default();
    match parts.next().filter(|query| !query.is_empty()) {
        Some(query) => (path.to_string(), Some(query.to_string())),
        None => (request.url.clone(), None),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
#[path = "canonical_tests.rs"]
mod tests;
