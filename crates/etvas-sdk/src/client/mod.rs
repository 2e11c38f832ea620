//! Etvas platform API client.
//!
//! [`EtvasClient`] wraps every platform endpoint the SDK exposes. Each call
//! validates its arguments, attaches the API key and default headers, goes
//! through the [`RequestSigner`] and is sent by a [`Transport`].
//!
//! Calls scoped to a customer token go through a [`TokenSession`], which
//! resolves the context id via a cached token validation.

mod data;
mod email;
mod profile;
mod session;
mod token;
pub mod transport;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::{ProductVariants, SdkConfig};
use crate::error::{ApiError, ConfigError};
use crate::request::OutboundRequest;
use crate::signing::{RequestSigner, API_KEY_HEADER};

pub use email::{EmailNotification, RawEmail, Recipient};
pub use session::TokenSession;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

/// Configuration for the HTTP client behind [`EtvasClient`].
///
/// # Examples
///
/// ```
/// use etvas_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User agent sent with every platform call
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("etvas-sdk/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout. Sub-second precision is dropped.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }
}

/// Client for the Etvas platform API.
///
/// Cloning is cheap; clones share the transport and the token cache.
///
/// # Examples
///
/// ```no_run
/// use etvas_sdk::client::EtvasClient;
/// use etvas_sdk::config::SdkConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SdkConfig::new("https://api.etvas.com", "my-api-key")
///     .with_request_signing_secret("request-secret");
/// let client = EtvasClient::new(&config)?;
///
/// client.write_data("settings", Some(serde_json::json!({"theme": "dark"}))).await?;
/// let settings = client.read_data("settings").await?;
/// println!("Settings: {:?}", settings);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EtvasClient {
    transport: Arc<dyn Transport>,
    signer: RequestSigner,
    api_key: String,
    token_cache: TtlCache<Value>,
    variants: ProductVariants,
}

impl EtvasClient {
    /// Create a client that talks to `config.api_url` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the API URL or key is invalid and
    /// `ApiError::Configuration` when the HTTP client cannot be built.
    pub fn new(config: &SdkConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.api_url, &config.client)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(config: &SdkConfig, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self {
            transport,
            signer: RequestSigner::new(config.api_key.clone(), config.request_signing_secret.clone()),
            api_key: config.api_key.clone(),
            token_cache: TtlCache::new(config.token_cache_ttl()),
            variants: config.product_variants.clone(),
        })
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Start a session scoped to a customer token.
    pub fn session(&self, token: impl Into<String>) -> TokenSession<'_> {
        TokenSession::new(self, token.into())
    }

    /// Look up the variant configured for a product.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVariant` when the product has no variant.
    pub fn product_variant(&self, product_id: &str) -> Result<&str, ConfigError> {
        self.variants
            .get(product_id)
            .ok_or_else(|| ConfigError::MissingVariant {
                product_id: product_id.to_string(),
            })
    }

    /// Send a request to the platform.
    ///
    /// Adds `x-api-key`, defaults `Accept` and `Content-Type` to
    /// `application/json`, and signs the request when a signing secret is
    /// configured.
    pub async fn execute(&self, mut request: OutboundRequest) -> Result<TransportResponse, ApiError> {
        request.set_header(API_KEY_HEADER, self.api_key.as_str());
        request.set_default_header("Accept", "application/json");
        request.set_default_header("Content-Type", "application/json");

        let request = self.signer.intercept(request)?;

        debug!(
            method = %request.method,
            url = %request.url,
            signed = self.signer.is_enabled(),
            "Sending platform request"
        );
        self.transport.send(request).await
    }

    pub(crate) fn token_cache(&self) -> &TtlCache<Value> {
        &self.token_cache
    }
}

impl fmt::Debug for EtvasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtvasClient")
            .field("api_key", &"<REDACTED>")
            .field("signer", &self.signer)
            .field("token_cache", &self.token_cache)
            .finish_non_exhaustive()
    }
}

/// Whether a response value carries data: not `null`, `false`, zero or `""`.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
