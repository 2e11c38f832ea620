//! Error types for Etvas SDK operations.
//!
//! Every public operation returns one of the enums below. Input problems are
//! [`ValidationError`]s, signature and API-key failures are [`AuthError`]s,
//! misconfiguration is a [`ConfigError`], and anything coming back from the
//! platform API is an [`ApiError`]. User event handlers fail with
//! [`HandlerError`], which the dispatcher always turns into a 500 response.

use serde_json::Value;
use thiserror::Error;

/// Input validation errors.
///
/// Raised synchronously, before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{context} error: {field} must be a non-empty string")]
    Required { context: String, field: String },

    /// A field has an invalid format.
    #[error("{context} error: invalid {field} ({message})")]
    InvalidFormat {
        context: String,
        field: String,
        message: String,
    },
}

impl ValidationError {
    pub(crate) fn required(context: &str, field: &str) -> Self {
        Self::Required {
            context: context.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(context: &str, field: &str, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            context: context.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Authentication failures for inbound events.
///
/// Each variant maps onto the HTTP status the webhook caller receives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request carried no body to verify.
    #[error("Missing body")]
    MissingBody,

    /// The signature (or API key) header is absent.
    #[error("Missing signature")]
    MissingSignature,

    /// The event envelope has no name.
    #[error("Empty name")]
    EmptyName,

    /// The event timestamp is malformed or outside the freshness window.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// The HMAC signature does not match the body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The API key header does not match the configured key.
    #[error("Invalid request")]
    InvalidApiKey,

    /// The verifier could not compute a signature with its configured secret.
    #[error("Event verification is misconfigured")]
    Misconfigured,
}

impl AuthError {
    /// HTTP status code returned to the webhook caller for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingBody
            | Self::MissingSignature
            | Self::EmptyName
            | Self::InvalidTimestamp => 400,
            Self::InvalidSignature | Self::InvalidApiKey => 403,
            Self::Misconfigured => 500,
        }
    }
}

/// Configuration and registration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration field is missing.
    #[error("Configuration field missing: {field}")]
    Missing { field: String },

    /// A configuration field has an invalid value.
    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: String, message: String },

    /// An event name is empty.
    #[error("Event name must be a non-empty string: {name:?}")]
    InvalidEventName { name: String },

    /// A different handler is already registered for the event.
    #[error("Cannot register multiple handlers for one event: {name}")]
    HandlerConflict { name: String },

    /// An alias was requested for an event that has no handler.
    #[error("Cannot add an alias for an unregistered event {name}")]
    UnknownEvent { name: String },

    /// No variant is configured for the product.
    #[error("Product variant: invalid configuration for {product_id}")]
    MissingVariant { product_id: String },
}

/// Errors from the HMAC engine and the request signer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The canonical value is not a signable string.
    #[error("Trying to sign an invalid canonical")]
    InvalidCanonical,

    /// The HMAC key is empty or unusable.
    #[error("Invalid hmac key")]
    InvalidKey,

    /// Signing was requested but no secret is configured.
    #[error("No signing secret configured")]
    MissingSecret,
}

/// Errors during TTL cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Cache keys must be non-empty.
    #[error("Cache: invalid key: {key:?}")]
    InvalidKey { key: String },

    /// The cache lock was poisoned by a panicking writer.
    #[error("Cache operation failed: {message}")]
    OperationFailed { message: String },
}

/// Errors during Etvas platform API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform answered with a non-success status.
    #[error("Request failed with status code {status}")]
    Upstream {
        status: u16,
        message: String,
        data: Value,
    },

    /// Network, TLS or timeout failure in the HTTP transport.
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The outgoing request could not be signed.
    #[error("Request signing failed: {0}")]
    Signing(#[from] SigningError),

    /// An argument failed validation before the request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Token validation cache failure.
    #[error("Token cache error: {0}")]
    Cache(#[from] CacheError),

    /// Token validation did not resolve to a context id.
    #[error("Token Read: invalid context")]
    InvalidContext,

    /// The client is misconfigured (bad base URL, HTTP client build failure).
    #[error("Client configuration error: {message}")]
    Configuration { message: String },
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Server errors (5xx), rate limiting (429) and transport failures are
    /// transient; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(_) => true,
            Self::Cache(_) => true,
            Self::Json(_)
            | Self::Signing(_)
            | Self::Validation(_)
            | Self::InvalidContext
            | Self::Configuration { .. } => false,
        }
    }

    /// Status and body of the upstream response, if this error carries one.
    pub fn upstream_response(&self) -> Option<(u16, &Value)> {
        match self {
            Self::Upstream { status, data, .. } => Some((*status, data)),
            _ => None,
        }
    }
}

/// Failure reported by a user-registered event handler.
///
/// When the failure came from a platform call, the upstream status and body
/// are kept so the webhook response can surface them as `proxyHttpStatus` and
/// `proxyHttpData`.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    upstream_status: Option<u16>,
    upstream_data: Option<Value>,
}

impl HandlerError {
    /// Create a handler error with a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            upstream_status: None,
            upstream_data: None,
        }
    }

    /// Attach the HTTP response of a failed upstream call.
    pub fn with_upstream(mut self, status: u16, data: Value) -> Self {
        self.upstream_status = Some(status);
        self.upstream_data = Some(data);
        self
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upstream status and body, if the handler failed on a platform call.
    pub fn upstream(&self) -> Option<(u16, &Value)> {
        match (self.upstream_status, self.upstream_data.as_ref()) {
            (Some(status), Some(data)) => Some((status, data)),
            _ => None,
        }
    }
}

impl From<ApiError> for HandlerError {
    fn from(error: ApiError) -> Self {
        let message = error.to_string();
        match error {
            ApiError::Upstream { status, data, .. } => Self::new(message).with_upstream(status, data),
            _ => Self::new(message),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
