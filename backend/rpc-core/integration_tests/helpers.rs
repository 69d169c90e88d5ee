//! Test helpers for RPC integration tests.
//!
//! This module provides a mock dbt RPC server built on wiremock:
//! - Replies that echo the request id like the real server
//! - Per-method mounting with call limits and priorities
//! - Clients and configs pointed at the mock

use rpc_core::client::{PollSettings, RpcClient};
use rpc_core::config::{ReadinessConfig, RpcConfig};
use rpc_core::transport::RpcTransport;

use std::net::TcpListener;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TEST_HOST: &str = "127.0.0.1";
pub const RPC_PATH: &str = "/jsonrpc";

/// Responds with a JSON-RPC envelope echoing the incoming request id.
pub enum RpcReply {
    Result(Value),
    Error(Value),
}

impl Respond for RpcReply {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get("id").cloned())
            .unwrap_or(Value::Null);

        let envelope = match self {
            RpcReply::Result(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            RpcReply::Error(error) => json!({"jsonrpc": "2.0", "id": id, "error": error}),
        };

        ResponseTemplate::new(200).set_body_json(envelope)
    }
}

/// Mount `reply` for calls to `rpc_method`.
///
/// `times` limits how often this mock answers; a lower `priority` wins while it still can.
pub async fn mount_method(
    server: &MockServer,
    rpc_method: &str,
    reply: RpcReply,
    times: Option<u64>,
    priority: u8,
) {
    let mut mock = Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(reply)
        .with_priority(priority);

    if let Some(times) = times {
        mock = mock.up_to_n_times(times);
    }

    mock.mount(server).await;
}

/// Mount a server that reports `state` for every `status` call.
pub async fn mount_status(server: &MockServer, state: &str) {
    mount_method(
        server,
        "status",
        RpcReply::Result(json!({"state": state, "pid": 4242})),
        None,
        5,
    )
    .await;
}

/// Mount an async method that hands out `token`.
pub async fn mount_async(server: &MockServer, rpc_method: &str, token: &str) {
    mount_method(
        server,
        rpc_method,
        RpcReply::Result(json!({"request_token": token})),
        None,
        5,
    )
    .await;
}

pub fn port_of(server: &MockServer) -> u16 {
    server.address().port()
}

/// A port nothing is listening on (bound, then released).
pub fn unused_port() -> u16 {
    TcpListener::bind((TEST_HOST, 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Failed to reserve a local port")
}

/// Config aimed at the loopback address with a short readiness budget.
pub fn test_config() -> RpcConfig {
    RpcConfig {
        host: TEST_HOST.to_string(),
        request_timeout_secs: 5,
        readiness: ReadinessConfig {
            attempts: 3,
            interval_ms: 100,
        },
        ..RpcConfig::default()
    }
}

pub fn client_for(server: &MockServer) -> RpcClient {
    client_for_port(port_of(server))
}

pub fn client_for_port(port: u16) -> RpcClient {
    let transport = RpcTransport::for_server(TEST_HOST, port, Duration::from_secs(5))
        .expect("Failed to build transport");
    RpcClient::new(transport).with_poll_settings(PollSettings::default())
}

/// Decoded bodies of every request the mock received, in arrival order.
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json::<Value>().expect("Request body is not JSON"))
        .collect()
}

/// Received bodies for `rpc_method` only.
pub async fn received_calls(server: &MockServer, rpc_method: &str) -> Vec<Value> {
    received_bodies(server)
        .await
        .into_iter()
        .filter(|body| body["method"] == rpc_method)
        .collect()
}

/// `args` as owned strings.
pub fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}
