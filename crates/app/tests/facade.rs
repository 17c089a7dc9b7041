//! Facade requests against a local mock server.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use probe::ResultKind;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_uses_default_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&server)
        .await;

    let result = probe::get(format!("{}/health", server.uri()))
        .status_code(200)
        .body_is_json()
        .run()
        .await;

    assert_eq!(result.kind(), ResultKind::Success);
}

#[tokio::test]
async fn test_put_sends_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result = probe::put(server.uri())
        .body("payload")
        .status_code(204)
        .body_is_empty()
        .run()
        .await;

    assert_eq!(result.kind(), ResultKind::Success);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
