//! Error types for the events service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

/// Event endpoint failures that happen before the SDK sees the request.
///
/// Authentication and handler failures are not errors at this level; they
/// come back from the dispatcher as an `EventResponse`.
#[derive(Debug, thiserror::Error)]
pub enum ApiHandlerError {
    /// An authentication header is not valid UTF-8
    ///
    /// Maps to: `400 Bad Request`
    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },

    /// Unexpected internal server error
    ///
    /// Maps to: `500 Internal Server Error`. Details are logged, the client
    /// gets a generic message.
    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl IntoResponse for ApiHandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidHeader { ref name } => {
                warn!(header = %name, "Rejected event with malformed header");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::InternalError { ref message } => {
                error!(error = %message, "Internal server error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error occurred".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid SDK configuration: {0}")]
    Sdk(#[from] etvas_sdk::ValidationError),

    #[error("Event dispatcher setup failed: {0}")]
    Dispatcher(#[from] etvas_sdk::ConfigError),
}
