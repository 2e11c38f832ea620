//! # Etvas Events API
//!
//! HTTP endpoint that receives platform events and hands them to an
//! [`EventDispatcher`].
//!
//! This crate provides:
//! - An axum router with the event endpoint and a health check
//! - Translation between HTTP and the SDK's event request/response types
//! - Layered configuration loading and tracing initialization
//! - Server startup with graceful shutdown
//!
//! # Examples
//!
//! ```rust,no_run
//! use etvas_events_api::{load_config, init_tracing, start_server, AppState};
//! use etvas_sdk::events::handler_fn;
//! use serde_json::Value;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = load_config(None)?;
//! init_tracing(&config.logging)?;
//!
//! let state = AppState::from_config(config)?;
//! state.dispatcher.on("product.purchased", handler_fn(|_payload: Value, _variant| async move {
//!     Ok(Value::Bool(true))
//! }))?;
//!
//! start_server(state).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use etvas_sdk::events::{
    EventDispatcher, EventRequest, EventResponse, EVENT_API_KEY_HEADER, EVENT_SIGNATURE_HEADER,
};
use serde::Serialize;
use std::{collections::HashMap, future::IntoFuture, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{load_config, EventsConfig, LoggingConfig, ServerConfig, ServiceConfig};
pub use errors::{ApiHandlerError, ConfigError, ServiceError};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Dispatcher that verifies events and runs registered handlers
    pub dispatcher: Arc<EventDispatcher>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }

    /// Validate the configuration and build a dispatcher from its SDK section.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dispatcher = EventDispatcher::from_config(&config.sdk)?;
        Ok(Self::new(config, Arc::new(dispatcher)))
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .route(&state.config.events.endpoint_path, post(handle_event))
        .route(config::HEALTH_PATH, get(handle_health_check))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let server = state.config.server.clone();
    let app = create_router(state);

    let address = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", address);

    let shutdown_timeout = Duration::from_secs(server.shutdown_timeout_seconds);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown_signal = async move {
        wait_for_shutdown_signal().await;
        let _ = signalled_tx.send(());
    };

    // In-flight requests get `shutdown_timeout` to finish once the signal fires
    let deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(shutdown_timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);
    tokio::select! {
        result = serve.into_future() => {
            result.map_err(|e| ServiceError::ServerFailed { message: e.to_string() })?;
        }
        _ = deadline => {
            error!(timeout_seconds = shutdown_timeout.as_secs(), "Graceful shutdown timed out");
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let json_layer = config
        .json_format
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!config.json_format).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// HTTP rendering of a dispatcher outcome.
#[derive(Debug)]
pub struct EventReply(pub EventResponse);

impl IntoResponse for EventReply {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.0.body() {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        }
    }
}

/// Handle a platform event delivery
#[instrument(skip(state, headers, body))]
pub async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<EventReply, ApiHandlerError> {
    debug!(size = body.len(), "Received event request");

    let request = EventRequest::new(header_map(&headers)?, body);
    let response = state.dispatcher.dispatch(&request).await;

    Ok(EventReply(response))
}

/// Lowercased header map. Values that are not valid UTF-8 are dropped,
/// except on the authentication headers, where they are an error.
fn header_map(headers: &HeaderMap) -> Result<HashMap<String, String>, ApiHandlerError> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        let name = name.as_str().to_lowercase();
        match value.to_str() {
            Ok(value) => {
                map.insert(name, value.to_string());
            }
            Err(_) if name == EVENT_SIGNATURE_HEADER || name == EVENT_API_KEY_HEADER => {
                return Err(ApiHandlerError::InvalidHeader { name });
            }
            Err(_) => debug!(header = %name, "Skipping non UTF-8 header"),
        }
    }
    Ok(map)
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub events: Vec<String>,
}

async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        events: state.dispatcher.registry().names(),
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
