//! Inbound webhook events.
//!
//! The platform delivers events as signed JSON `{name, payload, timestamp}`
//! bodies. [`EventVerifier`] authenticates them, [`HandlerRegistry`] maps
//! event names to [`EventHandler`]s and [`EventDispatcher`] ties both
//! together and produces an [`EventResponse`] for the HTTP layer.

pub mod dispatcher;
pub mod envelope;
pub mod handler;
pub mod registry;
pub mod verifier;

pub use dispatcher::{EventDispatcher, EventResponse};
pub use envelope::{EventEnvelope, EventRequest, EVENT_API_KEY_HEADER, EVENT_SIGNATURE_HEADER};
pub use handler::{handler_fn, EventHandler, FnHandler};
pub use registry::{EventNames, HandlerRegistry};
pub use verifier::{EventAuth, EventVerifier, VerifierOptions};
