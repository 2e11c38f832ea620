//! HTTP transport for platform calls.
//!
//! The client builds and signs an [`OutboundRequest`]; a [`Transport`]
//! puts it on the wire. [`ReqwestTransport`] is the production
//! implementation.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use super::ClientConfig;
use crate::error::ApiError;
use crate::request::OutboundRequest;
use crate::signing::encode_params;

/// Status and decoded body of a successful platform response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,

    /// JSON body, `Null` when empty, or a JSON string when the body is not JSON.
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Sends signed requests to the platform.
///
/// Implementations return `ApiError::Upstream` for non-2xx responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ApiError>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the base URL does not parse or
    /// the HTTP client cannot be created.
    pub fn new(base_url: &str, config: &ClientConfig) -> Result<Self, ApiError> {
        url::Url::parse(base_url).map_err(|e| ApiError::Configuration {
            message: format!("Invalid API URL {:?}: {}", base_url, e),
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a request: the base URL joined with the request
    /// path, followed by any explicit query parameters.
    pub fn request_url(&self, request: &OutboundRequest) -> String {
        let mut url = if is_absolute(&request.url) {
            request.url.clone()
        } else {
            format!("{}/{}", self.base_url, request.url.trim_start_matches('/'))
        };

        let query = encode_params(&request.params);
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        url
    }
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decode a response body: empty is `Null`, non-JSON text is kept as a string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ApiError> {
        let url = self.request_url(&request);

        let mut builder = self.http_client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body_text() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = decode_body(&text);

        if !status.is_success() {
            error!(
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                "Platform request failed"
            );
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown error").to_string(),
                data: body,
            });
        }

        debug!(method = %request.method, url = %request.url, status = status.as_u16(), "Platform request succeeded");
        Ok(TransportResponse::new(status.as_u16(), body))
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
