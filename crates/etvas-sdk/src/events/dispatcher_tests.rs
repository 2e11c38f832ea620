//! Tests for event dispatch.

use super::*;
use crate::events::handler::handler_fn;
use crate::signing::hmac::{sign, SignOptions};
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

const EVENT_SECRET: &str = "12345678";
const EVENT_NAME: &str = "event.test.name";

fn config() -> SdkConfig {
    SdkConfig::new("https://localhost:1234", "12345678")
        .with_event_secret(EVENT_SECRET)
        .with_product_variants(
            ProductVariants::new()
                .with_variant("key-1234", "first")
                .with_variant("key-2345", "second"),
        )
}

fn dispatcher() -> EventDispatcher {
    EventDispatcher::from_config(&config()).expect("dispatcher")
}

fn signed_event(name: &str, payload: Value) -> EventRequest {
    let body = json!({
        "name": name,
        "payload": payload,
        "timestamp": Utc::now().timestamp_millis()
    })
    .to_string();
    let signature = sign(&body, EVENT_SECRET, SignOptions::default())
        .expect("sign")
        .to_hex();
    let headers = HashMap::from([("x-etvas-signature".to_string(), signature)]);
    EventRequest::new(headers, Bytes::from(body))
}

fn purchase() -> Value {
    json!({"purchaseId": "1234", "productId": "2345"})
}

// ============================================================================
// Handler outcomes
// ============================================================================

mod outcome_tests {
    use super::*;

    #[tokio::test]
    async fn test_true_yields_no_content() {
        let dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(move |payload, _variant| {
                    let seen = seen_clone.clone();
                    async move {
                        *seen.lock().unwrap() = Some(payload);
                        Ok(Value::Bool(true))
                    }
                }),
            )
            .expect("register");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response, EventResponse::NoContent);
        assert_eq!(response.status_code(), 204);
        assert_eq!(response.body(), None);
        assert_eq!(*seen.lock().unwrap(), Some(purchase()));
    }

    #[tokio::test]
    async fn test_object_yields_json() {
        let dispatcher = dispatcher();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(|_payload, _variant| async move { Ok(json!({"foo": "bar"})) }),
            )
            .expect("register");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body(), Some(json!({"foo": "bar"})));
    }

    /// Verify `false` is treated as a regular value, not as a failure.
    #[tokio::test]
    async fn test_false_yields_json_false() {
        let dispatcher = dispatcher();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(|_payload, _variant| async move { Ok(Value::Bool(false)) }),
            )
            .expect("register");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response, EventResponse::Json(Value::Bool(false)));
    }

    #[tokio::test]
    async fn test_error_yields_500_with_message() {
        let dispatcher = dispatcher();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(|_payload, _variant| async move {
                    Err(HandlerError::new("something went wrong"))
                }),
            )
            .expect("register");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response.status_code(), 500);
        assert_eq!(response.body(), Some(json!({"error": "something went wrong"})));
    }

    /// Verify upstream HTTP failures are surfaced for diagnostics.
    #[tokio::test]
    async fn test_upstream_error_exposes_proxy_fields() {
        let dispatcher = dispatcher();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(|_payload, _variant| async move {
                    Err(HandlerError::new("Not Found").with_upstream(404, json!("error data")))
                }),
            )
            .expect("register");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response.status_code(), 500);
        assert_eq!(
            response.body(),
            Some(json!({
                "error": "Not Found",
                "proxyHttpStatus": 404,
                "proxyHttpData": "error data"
            }))
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_yields_500() {
        let dispatcher = dispatcher();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(|_payload, _variant| async move {
                    if true {
                        panic!("handler exploded");
                    }
                    Ok(Value::Null)
                }),
            )
            .expect("register");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response.status_code(), 500);
        assert!(!response.is_success());
    }
}

// ============================================================================
// Routing
// ============================================================================

mod routing_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_event_yields_not_implemented() {
        let response = dispatcher().dispatch(&signed_event("unknown.event", purchase())).await;

        assert_eq!(response.status_code(), 501);
        assert_eq!(response.body(), Some(json!({"error": "Not implemented"})));
    }

    #[tokio::test]
    async fn test_unregistered_handler_is_not_called() {
        let dispatcher = dispatcher();
        dispatcher
            .on(EVENT_NAME, handler_fn(|_p, _v| async move { Ok(Value::Bool(true)) }))
            .expect("register");
        dispatcher.off(EVENT_NAME).expect("unregister");

        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, purchase())).await;

        assert_eq!(response.status_code(), 501);
    }

    #[tokio::test]
    async fn test_alias_routes_to_same_handler() {
        let dispatcher = dispatcher();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(move |payload, _variant| {
                    let calls = calls_clone.clone();
                    async move {
                        calls.lock().unwrap().push(payload);
                        Ok(Value::Bool(true))
                    }
                }),
            )
            .expect("register");
        dispatcher.alias(EVENT_NAME, "event.test.alias").expect("alias");

        dispatcher.dispatch(&signed_event(EVENT_NAME, json!({"n": 1}))).await;
        dispatcher.dispatch(&signed_event("event.test.alias", json!({"n": 2}))).await;

        assert_eq!(*calls.lock().unwrap(), vec![json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_rejected_event_never_reaches_handler() {
        let dispatcher = dispatcher();
        let called = Arc::new(Mutex::new(false));
        let called_clone = called.clone();
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(move |_payload, _variant| {
                    let called = called_clone.clone();
                    async move {
                        *called.lock().unwrap() = true;
                        Ok(Value::Bool(true))
                    }
                }),
            )
            .expect("register");

        let body = json!({
            "name": EVENT_NAME,
            "payload": purchase(),
            "timestamp": Utc::now().timestamp_millis() - 1_200_000
        })
        .to_string();
        let signature = sign(&body, EVENT_SECRET, SignOptions::default())
            .expect("sign")
            .to_hex();
        let headers = HashMap::from([("x-etvas-signature".to_string(), signature)]);
        let request = EventRequest::new(headers, Bytes::from(body));

        let response = dispatcher.dispatch(&request).await;

        assert_eq!(response, EventResponse::Rejected(AuthError::InvalidTimestamp));
        assert_eq!(response.body(), Some(json!({"error": "Invalid timestamp"})));
        assert!(!*called.lock().unwrap());
    }
}

// ============================================================================
// Product variants
// ============================================================================

mod variant_tests {
    use super::*;

    async fn variant_seen(dispatcher: &EventDispatcher, product_id: &str) -> Option<String> {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        dispatcher.off(EVENT_NAME).expect("unregister");
        dispatcher
            .on(
                EVENT_NAME,
                handler_fn(move |_payload, variant| {
                    let seen = seen_clone.clone();
                    async move {
                        *seen.lock().unwrap() = variant;
                        Ok(Value::Null)
                    }
                }),
            )
            .expect("register");

        let payload = json!({"purchaseId": "1234", "productId": product_id});
        let response = dispatcher.dispatch(&signed_event(EVENT_NAME, payload)).await;
        assert_eq!(response.status_code(), 200);

        let variant = seen.lock().unwrap().clone();
        variant
    }

    #[tokio::test]
    async fn test_variant_resolved_from_product_id() {
        let dispatcher = dispatcher();
        assert_eq!(variant_seen(&dispatcher, "key-2345").await, Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_variant_absent_without_match() {
        let dispatcher = dispatcher();
        assert_eq!(variant_seen(&dispatcher, "key-2346").await, None);
    }

    #[tokio::test]
    async fn test_variant_absent_without_configuration() {
        let config = SdkConfig::new("https://localhost:1234", "12345678").with_event_secret(EVENT_SECRET);
        let dispatcher = EventDispatcher::from_config(&config).expect("dispatcher");
        assert_eq!(variant_seen(&dispatcher, "key-2345").await, None);
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_from_config_selects_signature_mode() {
    let dispatcher = dispatcher();
    assert!(matches!(dispatcher.verifier().auth(), EventAuth::Signature { .. }));
}

#[test]
fn test_from_config_without_secret_uses_api_key_mode() {
    let config = SdkConfig::new("https://localhost:1234", "12345678");
    let dispatcher = EventDispatcher::from_config(&config).expect("dispatcher");

    assert!(matches!(dispatcher.verifier().auth(), EventAuth::ApiKey { .. }));
}

#[test]
fn test_from_config_rejects_invalid_config() {
    let config = SdkConfig::new("https://localhost:1234", "123");
    assert!(matches!(
        EventDispatcher::from_config(&config),
        Err(ConfigError::Invalid { .. })
    ));
}

#[tokio::test]
async fn test_api_key_mode_dispatch() {
    let config = SdkConfig::new("https://localhost:1234", "12345678");
    let dispatcher = EventDispatcher::from_config(&config).expect("dispatcher");
    dispatcher
        .on(EVENT_NAME, handler_fn(|_p, _v| async move { Ok(Value::Bool(true)) }))
        .expect("register");

    let headers = HashMap::from([("x-api-key".to_string(), "12345678".to_string())]);
    let request = EventRequest::from_json(headers, &json!({"name": EVENT_NAME, "payload": {}}));
    assert_eq!(dispatcher.dispatch(&request).await, EventResponse::NoContent);

    let headers = HashMap::from([("x-api-key".to_string(), "wrong-key".to_string())]);
    let request = EventRequest::from_json(headers, &json!({"name": EVENT_NAME, "payload": {}}));
    let response = dispatcher.dispatch(&request).await;
    assert_eq!(response.status_code(), 403);
    assert_eq!(response.body(), Some(json!({"error": "Invalid request"})));
}
