//! HTTP client behavior against a local mock server.

use crosscheck_http::{HttpClient, HttpError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/thing"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/thing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).expect("client").with_retries(2);
    let got: serde_json::Value = client.get_json("/v1/thing", None).await.expect("get");
    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "nope"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).expect("client").with_retries(3);
    let err = client
        .get_json::<serde_json::Value>("/v1/missing", None)
        .await
        .unwrap_err();
    match err {
        HttpError::Api { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "nope");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn exhausted_retries_surface_the_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/broken"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "down"})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).expect("client").with_retries(1);
    let err = client
        .get_json::<serde_json::Value>("/v1/broken", None)
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Api { status, .. } if status.as_u16() == 503));
}

#[tokio::test]
async fn decode_errors_carry_a_body_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).expect("client");
    let err = client
        .get_json::<serde_json::Value>("/v1/html", None)
        .await
        .unwrap_err();
    match err {
        HttpError::Decode(_, snippet) => assert!(snippet.contains("not json")),
        other => panic!("expected Decode error, got {other:?}"),
    }
}
