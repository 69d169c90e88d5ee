use crate::helpers::{RpcReply, mount_async, mount_method, mount_status, port_of, received_calls, test_config};

use rpc_core::error::session::SessionError;
use rpc_core::error::supervisor::SupervisorError;
use rpc_core::session::{LastResult, Session};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use wiremock::MockServer;

async fn attached_session(server: &MockServer) -> Session {
    mount_status(server, "ready").await;
    let mut session = Session::new(test_config());
    session
        .start_line(&format!("rpc --existing --port {}", port_of(server)))
        .await
        .unwrap();
    session
}

/// **VALUE**: Verifies that operations before `start` fail with `NoServer`.
///
/// **BUG THIS CATCHES**: Would catch a panic on the missing server.
#[tokio::test]
async fn given_new_session_when_run_sql_then_no_server_error() {
    // GIVEN
    let mut session = Session::new(test_config());

    // WHEN
    let outcome = session.run_sql("select 1").await;

    // THEN
    assert!(matches!(outcome, Err(SessionError::NoServer { .. })));
    assert!(!session.is_running());
    assert!(session.last_result().is_none());
    session.stop().await;
}

/// **VALUE**: Verifies `run_sql`: row-limited query on the wire, rows decoded, and the
/// table kept as the last result.
///
/// **BUG THIS CATCHES**: Would catch the limit wrapper missing or the result not recorded.
#[tokio::test]
async fn given_attached_session_when_run_sql_then_table_returned_and_kept() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "run_sql", "tok-sql").await;
    mount_method(
        &server,
        "poll",
        RpcReply::Result(json!({
            "state": "success",
            "results": [{"table": {"column_names": ["id"], "rows": [[1], [2]]}}]
        })),
        None,
        5,
    )
    .await;
    let mut session = attached_session(&server).await;

    // WHEN
    let table = session.run_sql("select id from orders").await.unwrap();

    // THEN
    assert_eq!(table.column_names, vec!["id"]);
    assert_eq!(table.len(), 2);
    assert_eq!(session.last_result(), Some(&LastResult::Table(table)));
    let params = received_calls(&server, "run_sql").await[0]["params"].clone();
    let sql = String::from_utf8(BASE64.decode(params["sql"].as_str().unwrap()).unwrap()).unwrap();
    assert_eq!(sql, "select * from (select id from orders) dbt_run_sql limit 500");
    assert_eq!(params["name"], "test_run");
}

/// **VALUE**: Verifies `compile_sql` extracts `results[0].compiled_sql`.
#[tokio::test]
async fn given_attached_session_when_compile_sql_then_compiled_text_kept() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "compile_sql", "tok-compile").await;
    mount_method(
        &server,
        "poll",
        RpcReply::Result(json!({
            "state": "success",
            "results": [{"compiled_sql": "select * from analytics.orders"}]
        })),
        None,
        5,
    )
    .await;
    let mut session = attached_session(&server).await;

    // WHEN
    let compiled = session
        .compile_sql("select * from {{ ref('orders') }}")
        .await
        .unwrap();

    // THEN
    assert_eq!(compiled, "select * from analytics.orders");
    assert_eq!(
        session.last_result(),
        Some(&LastResult::Sql(compiled.clone()))
    );
    assert_eq!(
        received_calls(&server, "compile_sql").await[0]["params"]["name"],
        "test_compile"
    );
}

/// **VALUE**: Verifies that a compile result without compiled SQL is reported, not
/// turned into an empty string.
#[tokio::test]
async fn given_result_without_compiled_sql_when_compile_sql_then_unexpected_result() {
    // GIVEN
    let server = MockServer::start().await;
    mount_async(&server, "compile_sql", "tok-compile").await;
    mount_method(
        &server,
        "poll",
        RpcReply::Result(json!({"state": "success", "results": []})),
        None,
        5,
    )
    .await;
    let mut session = attached_session(&server).await;

    // WHEN
    let outcome = session.compile_sql("select 1").await;

    // THEN
    assert!(matches!(outcome, Err(SessionError::UnexpectedResult { .. })));
    assert!(session.last_result().is_none());
}

/// **VALUE**: Verifies that reload refuses to signal an attached server and that stop
/// is idempotent.
#[tokio::test]
async fn given_attached_session_when_reload_then_no_process_and_stop_idempotent() {
    // GIVEN
    let server = MockServer::start().await;
    let mut session = attached_session(&server).await;
    assert!(session.is_running());

    // WHEN
    let outcome = session.reload().await;

    // THEN
    assert!(matches!(
        outcome,
        Err(SessionError::Supervisor(SupervisorError::NoProcess { .. }))
    ));
    session.stop().await;
    session.stop().await;
    assert!(!session.is_running());
    assert!(matches!(
        session.client(),
        Err(SessionError::NoServer { .. })
    ));
}
