//! Common test utilities for the Etvas integration tests
//!
//! This module provides:
//! - Builders for signed event deliveries
//! - App state fixtures for both event authentication modes
//! - Signature recomputation for requests captured by a mock platform

use axum::{
    body::Body,
    http::Request,
    response::Response,
};
use etvas_events_api::{AppState, ServiceConfig};
use etvas_sdk::{
    signing::{prepare_signature, sign_bytes, SignOptions, CONTEXT_HEADER},
    OutboundRequest, ProductVariants, RequestBody, SdkConfig,
};
use serde_json::{json, Value};

#[allow(dead_code)]
pub const API_KEY: &str = "integration-api-key";

#[allow(dead_code)]
pub const EVENT_SECRET: &str = "integration-event-secret";

#[allow(dead_code)]
pub const SIGNING_SECRET: &str = "integration-signing-secret";

// ============================================================================
// Event fixtures
// ============================================================================

/// Event body stamped with the current time.
#[allow(dead_code)]
pub fn event_body(name: &str, payload: Value) -> Value {
    json!({
        "name": name,
        "payload": payload,
        "timestamp": chrono::Utc::now().timestamp_millis(),
    })
}

/// POST of `body` to `path` signed with `secret` in `x-etvas-signature`.
#[allow(dead_code)]
pub fn signed_event(path: &str, body: &Value, secret: &str) -> Request<Body> {
    let raw = body.to_string();
    let signature = sign_bytes(raw.as_bytes(), secret, SignOptions::default())
        .unwrap()
        .to_hex();

    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("x-etvas-signature", signature)
        .body(Body::from(raw))
        .unwrap()
}

/// POST of `body` to `path` authenticated with `x-api-key`.
#[allow(dead_code)]
pub fn api_key_event(path: &str, body: &Value, api_key: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("x-api-key", api_key)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// State that verifies events with HMAC signatures.
#[allow(dead_code)]
pub fn signature_mode_state(variants: ProductVariants) -> AppState {
    let sdk = SdkConfig::new("https://api.etvas.com", API_KEY)
        .with_event_secret(EVENT_SECRET)
        .with_product_variants(variants);
    AppState::from_config(ServiceConfig::new(sdk)).expect("valid state")
}

/// State that authenticates events with the API key.
#[allow(dead_code)]
pub fn api_key_mode_state() -> AppState {
    let sdk = SdkConfig::new("https://api.etvas.com", API_KEY);
    AppState::from_config(ServiceConfig::new(sdk)).expect("valid state")
}

/// Response body as JSON, `None` when empty.
#[allow(dead_code)]
pub async fn read_json(response: Response) -> Option<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    }
}

// ============================================================================
// Mock platform helpers
// ============================================================================

/// Client configuration pointing at a mock platform, with request signing on.
#[allow(dead_code)]
pub fn signing_client_config(api_url: &str) -> SdkConfig {
    SdkConfig::new(api_url, API_KEY).with_request_signing_secret(SIGNING_SECRET)
}

/// Header value of a request received by the mock platform.
#[allow(dead_code)]
pub fn received_header<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
}

/// Recompute the signature of a request received by the mock platform
/// from what actually went over the wire.
#[allow(dead_code)]
pub fn expected_signature(request: &wiremock::Request) -> String {
    let mut url = request.url.path().to_string();
    if let Some(query) = request.url.query() {
        url.push('?');
        url.push_str(query);
    }

    let mut outbound = OutboundRequest::new(url).with_method(request.method.clone());
    for name in ["content-type", CONTEXT_HEADER] {
        if let Some(value) = received_header(request, name) {
            outbound = outbound.with_header(name, value);
        }
    }
    if !request.body.is_empty() {
        outbound.body = Some(RequestBody::Raw(
            String::from_utf8(request.body.clone()).unwrap(),
        ));
    }

    let timestamp: i64 = received_header(request, "x-timestamp")
        .expect("timestamp header")
        .parse()
        .unwrap();

    prepare_signature(&outbound, API_KEY, SIGNING_SECRET, Some(timestamp))
        .unwrap()
        .signature
}
