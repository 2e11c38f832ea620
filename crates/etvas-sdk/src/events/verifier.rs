//! Inbound event verification.
//!
//! Each webhook call goes through the same checks, in order:
//!
//! 1. the body is a JSON object (`400 Missing body`)
//! 2. the authentication header is present (`400 Missing signature`)
//! 3. the event has a name (`400 Empty name`)
//! 4. the timestamp is within the freshness window (`400 Invalid timestamp`)
//! 5. the HMAC signature or API key matches (`403`)
//!
//! Step 4 only applies to signature mode. When the header is missing but the
//! debug bypass is active, steps 4 and 5 are skipped.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::envelope::{EventEnvelope, EventRequest, EVENT_API_KEY_HEADER, EVENT_SIGNATURE_HEADER};
use crate::config::{sdk_debug_enabled, SdkConfig, SecretString};
use crate::error::{AuthError, ConfigError};
use crate::signing::hmac::{constant_time_eq, verify_bytes, SignOptions, SignatureRef};

const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_millis(60_000);

/// How inbound events are authenticated. One mode per deployment.
#[derive(Clone)]
pub enum EventAuth {
    /// HMAC-SHA256 of the raw body in `x-etvas-signature`.
    Signature { event_secret: SecretString },

    /// Plain API key equality on `x-api-key`.
    ApiKey { api_key: SecretString },
}

impl EventAuth {
    /// Header carrying the credential for this mode.
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Signature { .. } => EVENT_SIGNATURE_HEADER,
            Self::ApiKey { .. } => EVENT_API_KEY_HEADER,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let (field, credential) = match self {
            Self::Signature { event_secret } => ("event_secret", event_secret),
            Self::ApiKey { api_key } => ("api_key", api_key),
        };
        if credential.is_empty() {
            return Err(ConfigError::Missing {
                field: field.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for EventAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature { .. } => f.write_str("Signature { event_secret: <REDACTED> }"),
            Self::ApiKey { .. } => f.write_str("ApiKey { api_key: <REDACTED> }"),
        }
    }
}

/// Verification settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierOptions {
    /// Maximum distance between the event timestamp and now, in either direction.
    pub freshness_window: Duration,

    /// Config-level request to skip signature checks when the header is missing.
    pub suppress_signature_check: bool,

    /// Fixed value for the process-wide `ETVAS_SDK_DEBUG` toggle. `None`
    /// reads the environment on every request.
    pub process_debug: Option<bool>,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            suppress_signature_check: false,
            process_debug: None,
        }
    }
}

impl VerifierOptions {
    /// Options from SDK configuration. `ETVAS_SDK_DEBUG` is read per request.
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            freshness_window: config.event_freshness_window(),
            suppress_signature_check: config.debug.bypass_requested(),
            process_debug: None,
        }
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_debug_bypass(mut self, suppress_signature_check: bool, process_debug: bool) -> Self {
        self.suppress_signature_check = suppress_signature_check;
        self.process_debug = Some(process_debug);
        self
    }

    fn bypass_active(&self) -> bool {
        self.suppress_signature_check && self.process_debug.unwrap_or_else(sdk_debug_enabled)
    }
}

/// Authenticates inbound webhook calls.
#[derive(Debug, Clone)]
pub struct EventVerifier {
    auth: EventAuth,
    options: VerifierOptions,
}

impl EventVerifier {
    /// Create a verifier.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when the event secret or API key is empty.
    pub fn new(auth: EventAuth, options: VerifierOptions) -> Result<Self, ConfigError> {
        auth.check()?;
        Ok(Self { auth, options })
    }

    pub fn auth(&self) -> &EventAuth {
        &self.auth
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Verify a request against the current time.
    pub fn verify(&self, request: &EventRequest) -> Result<EventEnvelope, AuthError> {
        self.verify_at(request, Utc::now().timestamp_millis())
    }

    /// Verify a request against a given time in epoch milliseconds.
    pub fn verify_at(&self, request: &EventRequest, now_ms: i64) -> Result<EventEnvelope, AuthError> {
        let body = parse_body(request.body()).ok_or_else(|| {
            warn!("Rejecting event without a JSON object body");
            AuthError::MissingBody
        })?;

        let credential = request.header(self.auth.header_name()).filter(|v| !v.is_empty());
        let bypass = credential.is_none() && self.options.bypass_active();
        if credential.is_none() && !bypass {
            warn!(header = self.auth.header_name(), "Rejecting event without credentials");
            return Err(AuthError::MissingSignature);
        }

        let name = match body.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => {
                warn!("Rejecting event without a name");
                return Err(AuthError::EmptyName);
            }
        };

        let timestamp = body.get("timestamp").and_then(Value::as_f64);

        if let Some(credential) = credential {
            match &self.auth {
                EventAuth::Signature { event_secret } => {
                    if !self.is_fresh(timestamp, now_ms) {
                        warn!(event = %name, "Rejecting stale or malformed event timestamp");
                        return Err(AuthError::InvalidTimestamp);
                    }
                    let valid = verify_bytes(
                        request.body(),
                        SignatureRef::Hex(credential),
                        event_secret.expose_secret(),
                        SignOptions::default(),
                    )
                    .map_err(|e| {
                        error!(event = %name, error = %e, "Could not compute event signature");
                        AuthError::Misconfigured
                    })?;
                    if !valid {
                        warn!(event = %name, "Invalid event signature");
                        return Err(AuthError::InvalidSignature);
                    }
                }
                EventAuth::ApiKey { api_key } => {
                    if !constant_time_eq(credential.as_bytes(), api_key.expose_secret().as_bytes()) {
                        warn!(event = %name, "Invalid event API key");
                        return Err(AuthError::InvalidApiKey);
                    }
                }
            }
            info!(event = %name, "Event authenticated");
        } else {
            warn!(event = %name, "Event signature check bypassed by debug configuration");
        }

        Ok(EventEnvelope {
            name,
            payload: body.get("payload").cloned().unwrap_or(Value::Null),
            timestamp,
        })
    }

    fn is_fresh(&self, timestamp: Option<f64>, now_ms: i64) -> bool {
        let Some(timestamp) = timestamp.filter(|ts| ts.is_finite() && *ts > 0.0) else {
            return false;
        };
        let window = self.options.freshness_window.as_millis() as f64;
        (now_ms as f64 - timestamp).abs() <= window
    }
}

fn parse_body(body: &[u8]) -> Option<Map<String, Value>> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
