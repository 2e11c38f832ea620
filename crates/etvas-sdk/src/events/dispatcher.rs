//! Event dispatch.
//!
//! The dispatcher authenticates an inbound call, looks up the handler for
//! the event name and turns the handler outcome into an [`EventResponse`].
//! Handler failures, including panics, always end up as a 500 response.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use super::envelope::{EventEnvelope, EventRequest};
use super::handler::EventHandler;
use super::registry::{EventNames, HandlerRegistry};
use super::verifier::{EventAuth, EventVerifier, VerifierOptions};
use crate::config::{ProductVariants, SdkConfig, SecretString};
use crate::error::{AuthError, ConfigError, HandlerError};

/// Outcome of dispatching one event, ready to be written as HTTP.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResponse {
    /// 204 - the handler returned `true`
    NoContent,

    /// 200 - the handler returned a value
    Json(Value),

    /// 400/403 - the call failed authentication
    Rejected(AuthError),

    /// 501 - no handler for the event
    NotImplemented { name: String },

    /// 500 - the handler failed
    Failed {
        error: String,
        proxy_http_status: Option<u16>,
        proxy_http_data: Option<Value>,
    },
}

impl EventResponse {
    /// HTTP status code for this response.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoContent => 204,
            Self::Json(_) => 200,
            Self::Rejected(reason) => reason.status_code(),
            Self::NotImplemented { .. } => 501,
            Self::Failed { .. } => 500,
        }
    }

    /// JSON body, if the response has one.
    pub fn body(&self) -> Option<Value> {
        match self {
            Self::NoContent => None,
            Self::Json(value) => Some(value.clone()),
            Self::Rejected(reason) => Some(json!({ "error": reason.to_string() })),
            Self::NotImplemented { .. } => Some(json!({ "error": "Not implemented" })),
            Self::Failed {
                error,
                proxy_http_status,
                proxy_http_data,
            } => {
                let mut body = Map::new();
                body.insert("error".to_string(), Value::String(error.clone()));
                if let Some(status) = proxy_http_status {
                    body.insert("proxyHttpStatus".to_string(), json!(status));
                }
                if let Some(data) = proxy_http_data {
                    body.insert("proxyHttpData".to_string(), data.clone());
                }
                Some(Value::Object(body))
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::NoContent | Self::Json(_))
    }

    fn from_handler_error(error: HandlerError) -> Self {
        let (proxy_http_status, proxy_http_data) = match error.upstream() {
            Some((status, data)) => (Some(status), Some(data.clone())),
            None => (None, None),
        };
        Self::Failed {
            error: error.message().to_string(),
            proxy_http_status,
            proxy_http_data,
        }
    }
}

/// Routes verified events to registered handlers.
///
/// # Examples
///
/// ```rust,no_run
/// use etvas_sdk::config::SdkConfig;
/// use etvas_sdk::events::{handler_fn, EventDispatcher, EventRequest};
/// use serde_json::Value;
///
/// # async fn example(request: EventRequest) -> Result<(), Box<dyn std::error::Error>> {
/// let config = SdkConfig::new("https://api.etvas.com", "my-api-key")
///     .with_event_secret("event-secret");
/// let dispatcher = EventDispatcher::from_config(&config)?;
///
/// dispatcher.on("product.purchased", handler_fn(|_payload: Value, _variant| async move {
///     Ok(Value::Bool(true))
/// }))?;
///
/// let response = dispatcher.dispatch(&request).await;
/// println!("Status: {}", response.status_code());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    verifier: EventVerifier,
    registry: Arc<HandlerRegistry>,
    variants: ProductVariants,
}

impl EventDispatcher {
    pub fn new(verifier: EventVerifier, registry: Arc<HandlerRegistry>, variants: ProductVariants) -> Self {
        Self {
            verifier,
            registry,
            variants,
        }
    }

    /// Build a dispatcher from SDK configuration.
    ///
    /// With an event secret configured, events are verified by HMAC
    /// signature; otherwise the API key header is compared.
    ///
    /// The debug bypass flags are taken from `config`; the
    /// `ETVAS_SDK_DEBUG` toggle is read again for every request, so it can
    /// be flipped after the dispatcher is built.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configuration fails validation.
    pub fn from_config(config: &SdkConfig) -> Result<Self, ConfigError> {
        config.validate().map_err(|e| ConfigError::Invalid {
            field: "sdk".to_string(),
            message: e.to_string(),
        })?;

        let auth = match config.event_secret.as_ref().filter(|s| !s.is_empty()) {
            Some(secret) => EventAuth::Signature {
                event_secret: secret.clone(),
            },
            None => EventAuth::ApiKey {
                api_key: SecretString::from(config.api_key.as_str()),
            },
        };

        Ok(Self::new(
            EventVerifier::new(auth, VerifierOptions::from_config(config))?,
            Arc::new(HandlerRegistry::new()),
            config.product_variants.clone(),
        ))
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn verifier(&self) -> &EventVerifier {
        &self.verifier
    }

    /// Register a handler. See [`HandlerRegistry::register`].
    pub fn on(
        &self,
        names: impl Into<EventNames>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ConfigError> {
        self.registry.register(names, handler)
    }

    /// Remove handlers. See [`HandlerRegistry::unregister`].
    pub fn off(&self, names: impl Into<EventNames>) -> Result<(), ConfigError> {
        self.registry.unregister(names)
    }

    /// Alias an event. See [`HandlerRegistry::alias`].
    pub fn alias(&self, name: &str, aliases: impl Into<EventNames>) -> Result<(), ConfigError> {
        self.registry.alias(name, aliases)
    }

    /// Verify and dispatch one inbound call.
    ///
    /// # Panics
    ///
    /// Panics if not polled inside a Tokio runtime; handlers run on
    /// `tokio::spawn`.
    pub async fn dispatch(&self, request: &EventRequest) -> EventResponse {
        match self.verifier.verify(request) {
            Ok(envelope) => self.dispatch_envelope(envelope).await,
            Err(reason) => EventResponse::Rejected(reason),
        }
    }

    /// Dispatch an already verified event.
    ///
    /// # Panics
    ///
    /// Panics if not polled inside a Tokio runtime.
    pub async fn dispatch_envelope(&self, envelope: EventEnvelope) -> EventResponse {
        let EventEnvelope { name, payload, .. } = envelope;

        let Some(handler) = self.registry.get(&name) else {
            warn!(event = %name, "No handler registered for event");
            return EventResponse::NotImplemented { name };
        };

        let variant = if self.variants.is_empty() {
            None
        } else {
            self.variants.variant_for_payload(&payload)
        };

        // Run on its own task so a panicking handler surfaces as a JoinError
        let outcome = tokio::spawn(async move { handler.handle(payload, variant).await }).await;

        let response = match outcome {
            Ok(Ok(Value::Bool(true))) => EventResponse::NoContent,
            Ok(Ok(value)) => EventResponse::Json(value),
            Ok(Err(e)) => {
                error!(event = %name, error = %e, "Event handler failed");
                EventResponse::from_handler_error(e)
            }
            Err(join_error) => {
                error!(event = %name, error = %join_error, "Event handler panicked");
                EventResponse::Failed {
                    error: "Event handler panicked".to_string(),
                    proxy_http_status: None,
                    proxy_http_data: None,
                }
            }
        };

        info!(event = %name, status = response.status_code(), "Event dispatched");
        response
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
