use crate::helpers::{RpcReply, client_for, mount_async, mount_method, received_calls};

use rpc_core::client::{PollSettings, SelectionArgs};
use rpc_core::error::client::ClientError;
use models::{RpcResponse, TaskState};

use std::time::{Duration, Instant};

use serde_json::{Map, json};
use wiremock::MockServer;

async fn mount_poll_sequence(server: &MockServer, running_polls: u64, final_reply: RpcReply) {
    mount_method(
        server,
        "poll",
        RpcReply::Result(json!({"state": "running", "logs": []})),
        Some(running_polls),
        1,
    )
    .await;
    mount_method(server, "poll", final_reply, None, 5).await;
}

/// **VALUE**: Verifies the fixed 500ms cadence: three "running" polls then "success"
/// completes after about 1.5s.
///
/// **WHY THIS MATTERS**: Callers budget test timeouts on this cadence.
///
/// **BUG THIS CATCHES**: Would catch backoff growth (much slower) or a missing sleep
/// (hammering the server).
#[tokio::test]
async fn given_task_running_three_polls_when_async_wait_then_success_after_fixed_cadence() {
    // GIVEN
    let server = MockServer::start().await;
    mount_poll_sequence(
        &server,
        3,
        RpcReply::Result(json!({"state": "success", "results": []})),
    )
    .await;
    let mut client = client_for(&server);

    // WHEN
    let started = Instant::now();
    let response = client
        .async_wait("tok-1", &PollSettings::default())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // THEN
    assert!(matches!(response, RpcResponse::Result { .. }));
    assert_eq!(received_calls(&server, "poll").await.len(), 4);
    assert!(elapsed >= Duration::from_millis(1450), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "elapsed {elapsed:?}");
}

/// **VALUE**: Verifies that a task that never finishes raises `PollTimeout` near the limit.
///
/// **BUG THIS CATCHES**: Would catch an unbounded loop or a timeout without last state.
#[tokio::test]
async fn given_task_always_running_when_async_wait_then_poll_timeout_with_last_state() {
    // GIVEN
    let server = MockServer::start().await;
    mount_method(
        &server,
        "poll",
        RpcReply::Result(json!({"state": "running"})),
        None,
        5,
    )
    .await;
    let mut client = client_for(&server);
    let settings = PollSettings::default().with_timeout(Duration::from_secs(2));

    // WHEN
    let started = Instant::now();
    let outcome = client.async_wait("tok-slow", &settings).await;
    let elapsed = started.elapsed();

    // THEN
    match outcome {
        Err(ClientError::PollTimeout { last_state, .. }) => {
            assert_eq!(last_state, Some(TaskState::Running));
        }
        other => panic!("Expected poll timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3500), "elapsed {elapsed:?}");
}

/// **VALUE**: Verifies that an error reported while polling ends the wait immediately.
///
/// **BUG THIS CATCHES**: Would catch error envelopes being polled again until timeout.
#[tokio::test]
async fn given_task_fails_when_async_wait_then_error_response_returned() {
    // GIVEN
    let server = MockServer::start().await;
    mount_poll_sequence(
        &server,
        1,
        RpcReply::Error(json!({"code": 10003, "message": "Database Error"})),
    )
    .await;
    let mut client = client_for(&server);

    // WHEN
    let response = client
        .async_wait("tok-bad", &PollSettings::default())
        .await
        .unwrap();

    // THEN
    assert!(response.is_error());
    assert_eq!(received_calls(&server, "poll").await.len(), 2);
}

/// **VALUE**: Verifies the full async flow: start a task, wait, get its result; and the
/// failure flow returning the error payload.
#[tokio::test]
async fn given_async_exchange_when_waited_then_result_or_error_payload() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "compile", "tok-compile").await;
    mount_poll_sequence(
        &server,
        1,
        RpcReply::Result(json!({"state": "success", "results": [{"node": "m"}]})),
    )
    .await;
    let mut client = client_for(&server);

    // WHEN
    let exchange = client.compile(SelectionArgs::default()).await.unwrap();
    let result = client.async_wait_for_result(&exchange, None).await.unwrap();

    // THEN
    assert_eq!(result["results"][0]["node"], "m");
    let polls = received_calls(&server, "poll").await;
    assert_eq!(polls[0]["params"], json!({"request_token": "tok-compile"}));

    // AND: expecting an error from a successful task is a protocol mismatch
    let second = client.compile(SelectionArgs::default()).await.unwrap();
    assert!(matches!(
        client.async_wait_for_error(&second, None).await,
        Err(ClientError::Response(_))
    ));
}

/// **VALUE**: Verifies that `async_wait_for_error` returns the task's error payload.
#[tokio::test]
async fn given_failing_task_when_async_wait_for_error_then_payload_returned() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "seed", "tok-seed").await;
    mount_method(
        &server,
        "poll",
        RpcReply::Error(json!({"code": 10004, "message": "Compilation Error"})),
        None,
        5,
    )
    .await;
    let mut client = client_for(&server);

    // WHEN
    let exchange = client.seed(Default::default()).await.unwrap();
    let error = client.async_wait_for_error(&exchange, None).await.unwrap();

    // THEN
    assert_eq!(error["message"], "Compilation Error");
}

/// **VALUE**: Verifies that `execute` polls asynchronous methods to completion.
#[tokio::test]
async fn given_async_method_when_execute_then_polls_to_result() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "deps", "tok-deps").await;
    mount_method(
        &server,
        "poll",
        RpcReply::Result(json!({"state": "success", "logs": []})),
        None,
        5,
    )
    .await;
    let mut client = client_for(&server);

    // WHEN
    let result = client.execute("deps", Map::new()).await.unwrap();

    // THEN
    assert_eq!(result["state"], "success");
}

/// **VALUE**: Verifies `wait_for_status` returns true once the server reports the state and
/// false when attempts run out.
#[tokio::test]
async fn given_status_sequence_when_wait_for_status_then_true_or_false() {
    // GIVEN: "compiling" once, then "ready"
    let server = MockServer::start().await;
    mount_method(
        &server,
        "status",
        RpcReply::Result(json!({"state": "compiling"})),
        Some(1),
        1,
    )
    .await;
    mount_method(
        &server,
        "status",
        RpcReply::Result(json!({"state": "ready"})),
        None,
        5,
    )
    .await;
    let mut client = client_for(&server).with_poll_settings(PollSettings {
        interval: Duration::from_millis(50),
        ..PollSettings::default()
    });

    // WHEN / THEN
    assert!(client.wait_for_status("ready", 5).await.unwrap());
    assert!(!client.wait_for_status("error", 2).await.unwrap());
    assert_eq!(received_calls(&server, "status").await.len(), 4);
}
