use crate::helpers::{RPC_PATH, TEST_HOST, port_of, unused_port};

use rpc_core::error::transport::TransportError;
use rpc_core::transport::RpcTransport;
use models::RpcRequest;

use std::time::Duration;

use serde_json::{Map, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies that one request is one JSON POST to `/jsonrpc`.
///
/// **WHY THIS MATTERS**: The server rejects requests without the JSON content type.
///
/// **BUG THIS CATCHES**: Would catch a wrong path or missing content-type header.
#[tokio::test]
async fn given_request_when_call_then_posts_json_envelope_to_rpc_path() {
    // GIVEN: A mock expecting exactly one JSON POST
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jsonrpc": "2.0", "id": 7, "result": {"state": "ready"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let transport =
        RpcTransport::for_server(TEST_HOST, port_of(&server), Duration::from_secs(5)).unwrap();

    // WHEN
    let response = transport
        .call(&RpcRequest::new("status", Map::new(), 7))
        .await
        .unwrap();

    // THEN
    assert_eq!(response["result"]["state"], "ready");
    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = received[0].body_json().unwrap();
    assert_eq!(
        body,
        json!({"jsonrpc": "2.0", "method": "status", "params": {}, "id": 7})
    );
}

/// **VALUE**: Verifies that a refused connection is a transport error, not a panic or retry.
///
/// **WHY THIS MATTERS**: Calls made after the server died must fail fast and visibly.
///
/// **BUG THIS CATCHES**: Would catch a hidden retry loop or a swallowed connect error.
#[tokio::test]
async fn given_nothing_listening_when_call_then_http_error() {
    // GIVEN
    let transport =
        RpcTransport::for_server(TEST_HOST, unused_port(), Duration::from_secs(2)).unwrap();

    // WHEN
    let outcome = transport
        .call(&RpcRequest::new("status", Map::new(), 1))
        .await;

    // THEN
    assert!(matches!(outcome, Err(TransportError::Http { .. })));
}

/// **VALUE**: Verifies that non-2xx replies are errors carrying status and body.
///
/// **BUG THIS CATCHES**: Would catch a 500 page being parsed as a JSON-RPC envelope.
#[tokio::test]
async fn given_server_error_status_when_call_then_status_error_with_body() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .mount(&server)
        .await;
    let transport =
        RpcTransport::for_server(TEST_HOST, port_of(&server), Duration::from_secs(5)).unwrap();

    // WHEN
    let outcome = transport
        .call(&RpcRequest::new("status", Map::new(), 1))
        .await;

    // THEN
    match outcome {
        Err(TransportError::Status { status, body, .. }) => {
            assert!(status.is_server_error());
            assert_eq!(body, "warming up");
        }
        other => panic!("Expected status error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a 200 reply with a non-JSON body is a JSON error.
#[tokio::test]
async fn given_non_json_body_when_call_then_json_error() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
        .mount(&server)
        .await;
    let transport =
        RpcTransport::for_server(TEST_HOST, port_of(&server), Duration::from_secs(5)).unwrap();

    // WHEN
    let outcome = transport
        .call(&RpcRequest::new("status", Map::new(), 1))
        .await;

    // THEN
    assert!(matches!(outcome, Err(TransportError::Json { .. })));
}

/// **VALUE**: Verifies that an unparseable endpoint is rejected at construction.
#[test]
fn given_invalid_endpoint_when_new_then_url_parse_error() {
    let outcome = RpcTransport::new("not a url", Duration::from_secs(1));
    assert!(matches!(outcome, Err(TransportError::UrlParse { .. })));
}
