use crate::helpers::{
    RpcReply, client_for, client_for_port, mount_async, mount_method, mount_status,
    received_bodies, received_calls, unused_port,
};

use rpc_core::client::{PsArgs, RunOperationArgs, SelectionArgs, SqlArgs, TestArgs};
use rpc_core::error::client::ClientError;
use rpc_core::error::response::ResponseError;
use rpc_core::error::transport::TransportError;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, json};
use wiremock::MockServer;

/// **VALUE**: Verifies that request ids are sequential and echoed ids are accepted.
///
/// **WHY THIS MATTERS**: The id echo is the only correlation between request and response.
///
/// **BUG THIS CATCHES**: Would catch every request reusing id 1, or an off-by-one that
/// makes the classifier reject correct responses.
#[tokio::test]
async fn given_two_calls_when_sent_then_ids_increment_and_results_classify() {
    // GIVEN
    let server = MockServer::start().await;
    mount_status(&server, "ready").await;
    let mut client = client_for(&server);

    // WHEN
    let first = client.status().await.unwrap();
    let second = client.status().await.unwrap();

    // THEN
    assert_eq!(first.request_id, 1);
    assert_eq!(second.request_id, 2);
    assert_eq!(second.result().unwrap()["state"], "ready");
    let ids: Vec<_> = received_bodies(&server)
        .await
        .iter()
        .map(|body| body["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

/// **VALUE**: Verifies the `ps` wire params: defaults ask for active tasks only, and
/// filters left out are not sent.
///
/// **BUG THIS CATCHES**: Would catch filters injected into a call that omitted them.
#[tokio::test]
async fn given_ps_filters_when_called_then_only_set_filters_sent() {
    // GIVEN
    let server = MockServer::start().await;
    mount_method(&server, "ps", RpcReply::Result(json!({"rows": []})), None, 5).await;
    let mut client = client_for(&server);

    // WHEN
    let exchange = client.ps(PsArgs::default()).await.unwrap();
    client
        .ps(PsArgs {
            active: None,
            completed: None,
        })
        .await
        .unwrap();

    // THEN
    assert_eq!(exchange.result().unwrap(), json!({"rows": []}));
    let calls = received_calls(&server, "ps").await;
    assert_eq!(calls[0]["params"], json!({"active": true, "completed": false}));
    assert_eq!(calls[1]["params"], json!({}));
}

/// **VALUE**: Verifies that unset optional params are omitted from the wire.
///
/// **WHY THIS MATTERS**: `"models": null` is not the same as no `models` to the server.
///
/// **BUG THIS CATCHES**: Would catch `None` fields serialized as `null`.
#[tokio::test]
async fn given_default_args_when_task_methods_called_then_params_empty() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "test", "tok-test").await;
    mount_async(&server, "run", "tok-run").await;
    let mut client = client_for(&server);

    // WHEN
    let test = client.test(TestArgs::default()).await.unwrap();
    let run = client
        .run(SelectionArgs {
            threads: Some(2),
            ..SelectionArgs::default()
        })
        .await
        .unwrap();

    // THEN
    assert_eq!(test.async_token().unwrap(), "tok-test");
    assert_eq!(run.async_token().unwrap(), "tok-run");
    assert_eq!(received_calls(&server, "test").await[0]["params"], json!({}));
    assert_eq!(
        received_calls(&server, "run").await[0]["params"],
        json!({"threads": 2})
    );
}

/// **VALUE**: Verifies that `run_sql` sends base64 of the exact SQL plus the default name.
///
/// **BUG THIS CATCHES**: Would catch raw SQL on the wire or a missing `name`.
#[tokio::test]
async fn given_sql_when_run_sql_then_wire_sql_is_base64_of_input() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "run_sql", "tok-sql").await;
    let mut client = client_for(&server);
    let sql = "select '✓' as ok\nfrom {{ ref('orders') }}";

    // WHEN
    client.run_sql(SqlArgs::new(sql)).await.unwrap();

    // THEN
    let params = received_calls(&server, "run_sql").await[0]["params"].clone();
    let decoded = BASE64.decode(params["sql"].as_str().unwrap()).unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), sql);
    assert_eq!(params["name"], "test_run");
    assert!(params.get("macros").is_none());
}

/// **VALUE**: Verifies run-operation's `macro` key and docs.generate's explicit flag.
///
/// **BUG THIS CATCHES**: Would catch `compile: false` being dropped or inverted.
#[tokio::test]
async fn given_named_params_when_sent_then_wire_keys_match_server_names() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "run-operation", "tok-op").await;
    mount_async(&server, "docs.generate", "tok-docs").await;
    let mut client = client_for(&server);

    // WHEN
    client
        .run_operation(RunOperationArgs {
            macro_name: "grant_select".to_string(),
            args: None,
        })
        .await
        .unwrap();
    client.docs_generate(Some(false)).await.unwrap();

    // THEN
    assert_eq!(
        received_calls(&server, "run-operation").await[0]["params"],
        json!({"macro": "grant_select"})
    );
    assert_eq!(
        received_calls(&server, "docs.generate").await[0]["params"],
        json!({"compile": false})
    );
}

/// **VALUE**: Verifies that a missing required param is refused without any network call.
#[tokio::test]
async fn given_missing_required_param_when_request_then_params_error_and_nothing_sent() {
    // GIVEN
    let server = MockServer::start().await;
    let mut client = client_for(&server);

    // WHEN
    let outcome = client.request("cli_args", Map::new()).await;

    // THEN
    assert!(matches!(outcome, Err(ClientError::Params { .. })));
    assert!(received_bodies(&server).await.is_empty());
}

/// **VALUE**: Verifies that server errors surface as `Rpc` and the error payload is readable.
///
/// **WHY THIS MATTERS**: Negative tests call a method expecting it to fail and inspect
/// the error code.
///
/// **BUG THIS CATCHES**: Would catch an error envelope being accepted as a result.
#[tokio::test]
async fn given_server_error_when_classified_then_rpc_error_and_error_payload() {
    // GIVEN
    let server = MockServer::start().await;
    mount_method(
        &server,
        "kill",
        RpcReply::Error(json!({"code": 10009, "message": "No such task"})),
        None,
        5,
    )
    .await;
    let mut client = client_for(&server);

    // WHEN
    let exchange = client.kill("no-such-task").await.unwrap();

    // THEN
    assert!(matches!(exchange.result(), Err(ResponseError::Rpc { .. })));
    assert_eq!(exchange.error().unwrap()["code"], 10009);
}

/// **VALUE**: Verifies that `execute` drives a synchronous method to its result directly.
#[tokio::test]
async fn given_sync_method_when_execute_then_returns_result_without_polling() {
    // GIVEN
    let server = MockServer::start().await;
    mount_method(&server, "gc", RpcReply::Result(json!({"deleted": []})), None, 5).await;
    let mut client = client_for(&server);

    // WHEN
    let result = client.execute("gc", Map::new()).await.unwrap();

    // THEN
    assert_eq!(result, json!({"deleted": []}));
    assert!(received_calls(&server, "poll").await.is_empty());
}

/// **VALUE**: Verifies that a dead server gives a transport error for any operation.
#[tokio::test]
async fn given_dead_server_when_status_then_transport_error() {
    let mut client = client_for_port(unused_port());

    let outcome = client.status().await;

    assert!(matches!(
        outcome,
        Err(ClientError::Transport(TransportError::Http { .. }))
    ));
}
