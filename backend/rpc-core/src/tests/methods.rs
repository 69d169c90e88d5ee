// Unit tests for the method table.

use crate::client::methods::{self, METHODS, lookup};
use crate::error::client::ClientError;

use serde_json::{Map, Value, json};

/// **VALUE**: Verifies that defaults fill only absent params, and that `ps` adds none.
///
/// **WHY THIS MATTERS**: An explicit caller choice must win over the default, and a `ps`
/// call without filters must reach the server without any.
///
/// **BUG THIS CATCHES**: Would catch defaults overwriting caller-supplied values, or
/// filters injected into a `ps` call that left them out.
#[test]
fn given_params_when_prepared_then_defaults_fill_only_absent_keys() {
    // GIVEN: run_sql with an explicit name, ps with nothing
    let mut sql = Map::new();
    sql.insert("sql".to_string(), json!("c2VsZWN0IDE="));
    sql.insert("name".to_string(), json!("my_query"));

    // WHEN: Preparing params
    let run = lookup(methods::RUN_SQL).unwrap().prepare(sql).expect("valid");
    let ps = lookup(methods::PS).unwrap().prepare(Map::new()).expect("valid");

    // THEN: caller's name kept, ps untouched
    assert_eq!(run["name"], json!("my_query"));
    assert!(ps.is_empty());
}

/// **VALUE**: Verifies that a missing required param is rejected before any I/O.
///
/// **WHY THIS MATTERS**: `kill` without a task id would be sent to the server and fail
/// with a less useful message.
///
/// **BUG THIS CATCHES**: Would catch the required check being skipped or treating `null`
/// as present.
#[test]
fn given_kill_without_task_id_when_prepared_then_params_error() {
    // GIVEN: kill params with an explicit null
    let spec = lookup(methods::KILL).expect("kill is known");
    let mut params = Map::new();
    params.insert("task_id".to_string(), Value::Null);

    // WHEN
    let outcome = spec.prepare(params);

    // THEN
    match outcome {
        Err(ClientError::Params { message, .. }) => assert!(message.contains("task_id")),
        other => panic!("Expected params error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that SQL methods get their default result name tag.
///
/// **WHY THIS MATTERS**: The server requires `name` on compile_sql/run_sql.
///
/// **BUG THIS CATCHES**: Would catch the two SQL variants sharing or losing their tags.
#[test]
fn given_sql_params_without_name_when_prepared_then_default_name_applied() {
    // GIVEN: SQL params with only the encoded text
    let mut params = Map::new();
    params.insert("sql".to_string(), json!("c2VsZWN0IDE="));

    // WHEN
    let run = lookup(methods::RUN_SQL).unwrap().prepare(params.clone()).unwrap();
    let compile = lookup(methods::COMPILE_SQL).unwrap().prepare(params).unwrap();

    // THEN
    assert_eq!(run["name"], json!("test_run"));
    assert_eq!(compile["name"], json!("test_compile"));
    assert!(!run.contains_key("macros"));
}

/// **VALUE**: Verifies the table has one row per method and marks task methods async.
///
/// **WHY THIS MATTERS**: `execute` decides whether to poll from this flag.
///
/// **BUG THIS CATCHES**: Would catch duplicate rows (lookup returns the first) or a task
/// method wrongly marked synchronous.
#[test]
fn given_method_table_when_inspected_then_names_unique_and_async_flags_set() {
    // GIVEN / WHEN
    let mut names: Vec<&str> = METHODS.iter().map(|spec| spec.name).collect();
    names.sort_unstable();
    let before = names.len();
    names.dedup();

    // THEN
    assert_eq!(before, names.len(), "method names must be unique");
    for name in [methods::RUN, methods::RUN_SQL, methods::TEST, methods::DOCS_GENERATE] {
        assert!(lookup(name).unwrap().asynchronous, "{name} should be async");
    }
    for name in [methods::STATUS, methods::PS, methods::POLL, methods::KILL] {
        assert!(!lookup(name).unwrap().asynchronous, "{name} should be sync");
    }
    assert!(lookup("no-such-method").is_none());
}
