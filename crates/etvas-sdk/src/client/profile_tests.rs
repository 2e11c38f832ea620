//! Tests for profile and purchase lookups.

use super::*;
use crate::config::SdkConfig;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(mock_server: &MockServer) -> EtvasClient {
    EtvasClient::new(&SdkConfig::new(mock_server.uri(), "1234")).expect("client")
}

// ============================================================================
// Profile
// ============================================================================

mod profile_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_profile_sends_context_and_merges_it() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .and(header("x-api-key", "1234"))
            .and(header("x-etvas-context", "my context"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Jane"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let profile = client_for(&mock_server).get_profile("my context").await.unwrap();

        assert_eq!(profile, Some(json!({"contextId": "my context", "name": "Jane"})));
    }

    #[tokio::test]
    async fn test_get_profile_without_data_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/profile"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let profile = client_for(&mock_server).get_profile("ctx").await.unwrap();

        assert_eq!(profile, None);
    }

    #[tokio::test]
    async fn test_get_profile_requires_context() {
        let mock_server = MockServer::start().await;

        let error = client_for(&mock_server).get_profile("").await.unwrap_err();

        assert!(matches!(error, ApiError::Validation(_)));
        assert!(error.to_string().contains("x-context-id"));
    }
}

// ============================================================================
// Purchase
// ============================================================================

mod purchase_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_purchase_appends_context_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/purchase"))
            .and(header("x-etvas-context", "my context"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"foo": "bar"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let purchase = client_for(&mock_server)
            .get_purchase::<&str, &str>("my context", &[])
            .await
            .unwrap()
            .expect("purchase");

        assert_eq!(purchase["contextId"], "my context");
        assert_eq!(purchase["foo"], "bar");
    }

    #[tokio::test]
    async fn test_get_purchase_appends_query_string() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/purchase"))
            .and(query_param("with", "trial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trial": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let purchase = client_for(&mock_server)
            .get_purchase("ctx", &[("with", "trial")])
            .await
            .unwrap();

        assert_eq!(purchase, Some(json!({"contextId": "ctx", "trial": true})));
    }

    /// Verify fields returned by the platform take precedence over the merged context id.
    #[test]
    fn test_response_fields_win_over_context_id() {
        let merged = with_context("ctx", json!({"contextId": "server-ctx", "a": 1}));

        assert_eq!(merged, Some(json!({"contextId": "server-ctx", "a": 1})));
    }

    #[test]
    fn test_non_object_data_is_kept() {
        assert_eq!(with_context("ctx", json!("OK")), Some(json!("OK")));
        assert_eq!(with_context("ctx", json!(false)), None);
        assert_eq!(with_context("ctx", Value::Null), None);
    }
}
