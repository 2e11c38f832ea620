//! Outbound request signing.

use std::fmt;

use tracing::debug;

use super::canonical::{prepare_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::config::SecretString;
use crate::error::SigningError;
use crate::request::{OutboundRequest, RequestBody};

/// Attaches `x-signature` and `x-timestamp` to outgoing requests.
///
/// Signing is opt-in: without a secret, requests pass through unchanged.
///
/// # Examples
///
/// ```rust
/// use etvas_sdk::request::OutboundRequest;
/// use etvas_sdk::signing::RequestSigner;
///
/// let signer = RequestSigner::new("1234", Some("a-secret".into()));
/// let request = OutboundRequest::new("/greet").with_header("Content-Type", "application/json");
///
/// let signed = signer.intercept(request).unwrap();
/// assert!(signed.header("x-signature").is_some());
/// assert!(signed.header("x-timestamp").is_some());
/// ```
#[derive(Clone)]
pub struct RequestSigner {
    api_key: String,
    secret: Option<SecretString>,
}

impl RequestSigner {
    pub fn new(api_key: impl Into<String>, secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            debug!("No request signing secret configured, outbound requests are sent unsigned");
        }
        Self {
            api_key: api_key.into(),
            secret,
        }
    }

    /// Whether requests get signed.
    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Sign a request with the current time.
    pub fn intercept(&self, request: OutboundRequest) -> Result<OutboundRequest, SigningError> {
        self.sign_request(request, None)
    }

    /// Sign a request with a fixed Unix timestamp.
    pub fn intercept_at(
        &self,
        request: OutboundRequest,
        timestamp: i64,
    ) -> Result<OutboundRequest, SigningError> {
        self.sign_request(request, Some(timestamp))
    }

    fn sign_request(
        &self,
        mut request: OutboundRequest,
        timestamp: Option<i64>,
    ) -> Result<OutboundRequest, SigningError> {
        let Some(secret) = &self.secret else {
            return Ok(request);
        };

        let prepared = prepare_signature(&request, &self.api_key, secret.expose_secret(), timestamp)?;

        request.set_header(SIGNATURE_HEADER, prepared.signature);
        request.set_header(TIMESTAMP_HEADER, prepared.timestamp.to_string());
        // Send exactly the bytes that were hashed
        request.body = prepared.canonical_body.map(RequestBody::Raw);

        Ok(request)
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &"<REDACTED>")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;
