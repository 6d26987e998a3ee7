use assert_matches::assert_matches;
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::{SupabaseClient, SupabaseError};

#[tokio::test]
async fn test_request_sends_service_key_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::with_base_url(&mock_server.uri(), "service-key");
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/appointments", None, None)
        .await
        .expect("request should succeed");

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_exclusion_violation_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23P01",
            "details": "Key conflicts with existing key.",
            "hint": null,
            "message": "conflicting key value violates exclusion constraint \"appointments_no_overlap\""
        })))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::with_base_url(&mock_server.uri(), "service-key");
    let err = client
        .request::<Vec<Value>>(Method::POST, "/rest/v1/appointments", Some(json!({})), None)
        .await
        .unwrap_err();

    assert!(err.is_exclusion_violation());
    assert!(!err.is_unique_violation());
    assert_eq!(err.constraint_name(), Some("appointments_no_overlap"));
}

#[tokio::test]
async fn test_server_errors_are_not_constraints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_blocks"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::with_base_url(&mock_server.uri(), "service-key");
    let err = client
        .request::<Vec<Value>>(Method::GET, "/rest/v1/schedule_blocks", None, None)
        .await
        .unwrap_err();

    assert_matches!(err, SupabaseError::Api { status: 503, .. });
}

#[tokio::test]
async fn test_empty_body_decodes_as_empty_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/schedule_blocks"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::with_base_url(&mock_server.uri(), "service-key");
    let rows: Vec<Value> = client
        .request(Method::DELETE, "/rest/v1/schedule_blocks", None, Some("return=minimal"))
        .await
        .expect("empty response should decode");

    assert!(rows.is_empty());
}
