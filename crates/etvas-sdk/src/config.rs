//! SDK configuration.
//!
//! [`SdkConfig`] carries the credentials and switches consumed by the
//! client, the request signer and the event verifier. It can be built in
//! code, deserialized from a config file, or read from `ETVAS_*` environment
//! variables.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::client::ClientConfig;
use crate::error::{ConfigError, ValidationError};
use crate::validation::{validate_api_key, validate_api_url};

/// Environment variable holding the platform API base URL.
pub const ENV_API_URL: &str = "ETVAS_API_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "ETVAS_API_KEY";

/// Environment variable holding the outbound request signing secret.
pub const ENV_REQ_SIGNATURE_SECRET: &str = "ETVAS_REQ_SIGNATURE_SECRET";

/// Environment variable holding the inbound event secret.
pub const ENV_EVENT_SECRET: &str = "ETVAS_EVENT_SECRET";

/// Process-wide toggle that allows the signature-check bypass.
pub const ENV_SDK_DEBUG: &str = "ETVAS_SDK_DEBUG";

const DEFAULT_FRESHNESS_WINDOW_MS: u64 = 60_000;
const DEFAULT_TOKEN_CACHE_TTL_SECS: u64 = 600;

/// A secret string, wiped from memory on drop.
///
/// Never printed by `Debug`; use [`SecretString::expose_secret`] at the
/// point of use.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value. Use immediately, do not store.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Debug switches for non-production testing.
///
/// Either flag requests the inbound signature bypass; it only takes effect
/// when [`sdk_debug_enabled`] is also true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub suppress_signature_check: bool,
    pub suppress_incoming_signature_check: bool,
}

impl DebugConfig {
    /// Whether either suppression flag is set.
    pub fn bypass_requested(&self) -> bool {
        self.suppress_signature_check || self.suppress_incoming_signature_check
    }
}

/// Read-only map from product id to variant label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductVariants(HashMap<String, String>);

impl ProductVariants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping.
    pub fn with_variant(mut self, product_id: impl Into<String>, variant: impl Into<String>) -> Self {
        self.0.insert(product_id.into(), variant.into());
        self
    }

    pub fn get(&self, product_id: &str) -> Option<&str> {
        self.0.get(product_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve the variant for an event payload via its `productId` field.
    ///
    /// Numeric product ids are matched by their decimal representation.
    pub fn variant_for_payload(&self, payload: &Value) -> Option<String> {
        let product_id = match payload.get("productId")? {
            Value::String(id) if !id.is_empty() => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        self.get(&product_id).map(str::to_string)
    }
}

impl FromIterator<(String, String)> for ProductVariants {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configuration consumed by the SDK core.
///
/// # Examples
///
/// ```
/// use etvas_sdk::config::{ProductVariants, SdkConfig};
///
/// let config = SdkConfig::new("https://api.etvas.com", "my-api-key")
///     .with_request_signing_secret("request-secret")
///     .with_event_secret("event-secret")
///     .with_product_variants(ProductVariants::new().with_variant("prod-1", "basic"));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub api_url: String,
    pub api_key: String,

    #[serde(default)]
    pub request_signing_secret: Option<SecretString>,

    #[serde(default)]
    pub event_secret: Option<SecretString>,

    #[serde(default)]
    pub product_variants: ProductVariants,

    #[serde(default)]
    pub debug: DebugConfig,

    /// Maximum age (and future skew) of an inbound event timestamp.
    #[serde(default = "default_freshness_window_ms")]
    pub event_freshness_window_ms: u64,

    /// Lifetime of a cached token validation.
    #[serde(default = "default_token_cache_ttl_secs")]
    pub token_cache_ttl_secs: u64,

    #[serde(default)]
    pub client: ClientConfig,
}

fn default_freshness_window_ms() -> u64 {
    DEFAULT_FRESHNESS_WINDOW_MS
}

fn default_token_cache_ttl_secs() -> u64 {
    DEFAULT_TOKEN_CACHE_TTL_SECS
}

impl SdkConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            request_signing_secret: None,
            event_secret: None,
            product_variants: ProductVariants::default(),
            debug: DebugConfig::default(),
            event_freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
            token_cache_ttl_secs: DEFAULT_TOKEN_CACHE_TTL_SECS,
            client: ClientConfig::default(),
        }
    }

    /// Build a configuration from `ETVAS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when the API URL or key is unset, and
    /// `ConfigError::Invalid` when they fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var(ENV_API_URL).map_err(|_| ConfigError::Missing {
            field: ENV_API_URL.to_string(),
        })?;
        let api_key = std::env::var(ENV_API_KEY).map_err(|_| ConfigError::Missing {
            field: ENV_API_KEY.to_string(),
        })?;

        let mut config = Self::new(api_url, api_key);
        config.request_signing_secret = non_empty_env(ENV_REQ_SIGNATURE_SECRET);
        config.event_secret = non_empty_env(ENV_EVENT_SECRET);

        config.validate().map_err(|e| ConfigError::Invalid {
            field: "sdk".to_string(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    pub fn with_request_signing_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.request_signing_secret = Some(secret.into());
        self
    }

    pub fn with_event_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.event_secret = Some(secret.into());
        self
    }

    pub fn with_product_variants(mut self, variants: ProductVariants) -> Self {
        self.product_variants = variants;
        self
    }

    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_event_freshness_window(mut self, window: Duration) -> Self {
        self.event_freshness_window_ms = window.as_millis() as u64;
        self
    }

    pub fn with_token_cache_ttl(mut self, ttl: Duration) -> Self {
        self.token_cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_client_config(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Check the API URL and key.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_api_url(&self.api_url, "init")?;
        validate_api_key(&self.api_key, "init")?;
        Ok(())
    }

    pub fn event_freshness_window(&self) -> Duration {
        Duration::from_millis(self.event_freshness_window_ms)
    }

    pub fn token_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.token_cache_ttl_secs)
    }

    /// Look up the variant configured for a product.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVariant` when the product has no variant.
    pub fn product_variant(&self, product_id: &str) -> Result<&str, ConfigError> {
        self.product_variants
            .get(product_id)
            .ok_or_else(|| ConfigError::MissingVariant {
                product_id: product_id.to_string(),
            })
    }
}

fn non_empty_env(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

/// Whether the process-wide debug toggle `ETVAS_SDK_DEBUG` is on.
///
/// Any value other than empty, `0` or `false` turns it on.
pub fn sdk_debug_enabled() -> bool {
    match std::env::var(ENV_SDK_DEBUG) {
        Ok(value) => {
            let value = value.trim();
            !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
        }
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
