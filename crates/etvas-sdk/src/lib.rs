//! # Etvas SDK
//!
//! Server-side SDK for products integrated with the Etvas platform.
//!
//! This SDK provides:
//! - Signed outbound calls to the platform API (token validation, customer
//!   profile, purchases, external data, email)
//! - Verification of inbound webhook events, by HMAC signature or API key
//! - Event handler registration and dispatch with HTTP-ready responses
//! - A TTL cache for token validation results
//!
//! # Examples
//!
//! ## Calling the platform
//!
//! ```rust,no_run
//! use etvas_sdk::{EtvasClient, SdkConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SdkConfig::new("https://api.etvas.com", "my-api-key")
//!     .with_request_signing_secret("request-secret");
//! let client = EtvasClient::new(&config)?;
//!
//! let session = client.session("token-from-url");
//! let profile = session.customer_profile().await?;
//! println!("Profile: {:?}", profile);
//! # Ok(())
//! # }
//! ```
//!
//! ## Handling events
//!
//! ```rust
//! use etvas_sdk::events::handler_fn;
//! use etvas_sdk::{EventDispatcher, SdkConfig};
//! use serde_json::Value;
//!
//! let config = SdkConfig::new("https://api.etvas.com", "my-api-key")
//!     .with_event_secret("event-secret");
//! let dispatcher = EventDispatcher::from_config(&config).unwrap();
//!
//! dispatcher
//!     .on(["product.purchased", "product.renewed"], handler_fn(|_payload: Value, variant| async move {
//!         println!("Variant: {:?}", variant);
//!         Ok(Value::Bool(true))
//!     }))
//!     .unwrap();
//!
//! assert!(dispatcher.registry().contains("product.renewed"));
//! ```

// Public modules
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod request;
pub mod signing;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use error::{
    ApiError, AuthError, CacheError, ConfigError, HandlerError, SigningError, ValidationError,
};

pub use cache::TtlCache;
pub use client::{
    ClientConfig, EmailNotification, EtvasClient, RawEmail, Recipient, TokenSession, Transport,
};
pub use config::{sdk_debug_enabled, DebugConfig, ProductVariants, SdkConfig, SecretString};
pub use events::{
    EventAuth, EventDispatcher, EventEnvelope, EventHandler, EventRequest, EventResponse,
    EventVerifier, HandlerRegistry,
};
pub use request::{OutboundRequest, RequestBody};
pub use signing::{prepare_signature, query_string, sign, verify, RequestSigner};
