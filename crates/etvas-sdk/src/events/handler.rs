//! Event handler trait for application-provided processing logic.
//!
//! Handlers receive the event payload together with the product variant
//! resolved from the payload's `productId`, and return a JSON value that
//! becomes the webhook response.
//!
//! # Examples
//!
//! ```rust,no_run
//! use etvas_sdk::events::EventHandler;
//! use etvas_sdk::error::HandlerError;
//! use async_trait::async_trait;
//! use serde_json::Value;
//!
//! struct PurchaseHandler;
//!
//! #[async_trait]
//! impl EventHandler for PurchaseHandler {
//!     async fn handle(&self, payload: Value, variant: Option<String>) -> Result<Value, HandlerError> {
//!         println!("Purchase for variant {:?}: {}", variant, payload);
//!         Ok(Value::Bool(true))
//!     }
//! }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HandlerError;

/// Application-provided event handler.
///
/// The returned value decides the webhook response: `true` becomes
/// `204 No Content`, any other value is sent as a `200` JSON body, and an
/// error becomes a `500`.
///
/// Handlers must be `Send + Sync`; overlapping deliveries of the same event
/// run concurrently.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event.
    ///
    /// # Arguments
    ///
    /// * `payload` - The event payload as sent by the platform
    /// * `variant` - Product variant configured for the payload's `productId`
    async fn handle(&self, payload: Value, variant: Option<String>) -> Result<Value, HandlerError>;
}

/// Handler backed by an async closure. Built with [`handler_fn`].
pub struct FnHandler<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F, Fut>
where
    F: Fn(Value, Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    async fn handle(&self, payload: Value, variant: Option<String>) -> Result<Value, HandlerError> {
        (self.f)(payload, variant).await
    }
}

/// Wrap an async closure as a shareable handler.
///
/// The returned `Arc` is the handler's identity: registering the same `Arc`
/// twice under one name is a no-op, a second `handler_fn` call is a
/// different handler.
///
/// ```rust
/// use etvas_sdk::events::handler_fn;
/// use serde_json::{json, Value};
///
/// let handler = handler_fn(|payload: Value, _variant| async move {
///     Ok(json!({ "received": payload }))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(Value, Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler {
        f,
        _future: PhantomData,
    })
}
