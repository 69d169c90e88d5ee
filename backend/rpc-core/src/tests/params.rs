// Unit tests for typed argument serialization.

use crate::client::params::{
    PsArgs, RunOperationArgs, SelectionArgs, Selector, SqlArgs, TestArgs, encode_sql, to_params,
};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, json};

/// **VALUE**: Verifies that unset optional arguments are omitted, not sent as null.
///
/// **WHY THIS MATTERS**: The server treats an absent param and a `null` param
/// differently; sending `null` can override its defaults.
///
/// **BUG THIS CATCHES**: Would catch a missing `skip_serializing_if` on any field.
#[test]
fn given_default_args_when_serialized_then_params_are_empty() {
    // GIVEN / WHEN
    let selection = to_params(&SelectionArgs::default()).unwrap();
    let test = to_params(&TestArgs::default()).unwrap();
    let ps = to_params(&PsArgs {
        active: None,
        completed: None,
    })
    .unwrap();

    // THEN
    assert!(selection.is_empty());
    assert!(test.is_empty());
    assert!(ps.is_empty());
}

/// **VALUE**: Verifies that default `ps` filters ask for active tasks only, and that each
/// filter can be set or left out on its own.
///
/// **BUG THIS CATCHES**: Would catch an unset filter forced to a value the caller never
/// chose.
#[test]
fn given_ps_args_when_serialized_then_each_filter_independent() {
    // GIVEN / WHEN
    let default = to_params(&PsArgs::default()).unwrap();
    let completed_only = to_params(&PsArgs {
        active: None,
        completed: Some(true),
    })
    .unwrap();

    // THEN
    assert_eq!(default["active"], json!(true));
    assert_eq!(default["completed"], json!(false));
    assert!(!completed_only.contains_key("active"));
    assert_eq!(completed_only["completed"], json!(true));
}

/// **VALUE**: Verifies selector shapes: a single spec is a string, several are a list.
///
/// **WHY THIS MATTERS**: The server accepts both shapes; wrapping one spec in an object
/// (the default enum encoding) would be rejected.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(untagged)]`.
#[test]
fn given_selectors_when_serialized_then_string_or_list() {
    // GIVEN
    let args = SelectionArgs {
        models: Some(Selector::from("my_model")),
        exclude: Some(Selector::from(vec!["a", "b"])),
        threads: Some(4),
        ..SelectionArgs::default()
    };

    // WHEN
    let params = to_params(&args).unwrap();

    // THEN
    assert_eq!(params["models"], json!("my_model"));
    assert_eq!(params["exclude"], json!(["a", "b"]));
    assert_eq!(params["threads"], json!(4));
    assert!(!params.contains_key("select"));
}

/// **VALUE**: Verifies that SQL is base64 of the exact input bytes, including non-ASCII.
///
/// **WHY THIS MATTERS**: Any normalization (trimming, re-encoding) changes the query the
/// server executes.
///
/// **BUG THIS CATCHES**: Would catch encoding a trimmed or lossy copy of the text.
#[test]
fn given_sql_with_unicode_and_whitespace_when_serialized_then_decodes_to_same_text() {
    // GIVEN: SQL with leading whitespace, newlines and non-ASCII
    let sql = "  select 'café' as name\n  from {{ ref('x') }}\n";
    let args = SqlArgs::new(sql).with_macros("{% macro m() %}1{% endmacro %}");

    // WHEN
    let params = to_params(&args).unwrap();

    // THEN
    let encoded = params["sql"].as_str().unwrap();
    assert_eq!(encoded, encode_sql(sql));
    let decoded = BASE64.decode(encoded).unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), sql);
    assert!(!params.contains_key("name"));
    assert_eq!(params["macros"], json!("{% macro m() %}1{% endmacro %}"));
}

/// **VALUE**: Verifies the `macro` wire name for run-operation.
///
/// **WHY THIS MATTERS**: `macro` is a Rust keyword-ish name kept as `macro_name` in code;
/// the wire name must still be `macro`.
///
/// **BUG THIS CATCHES**: Would catch a dropped `#[serde(rename)]`.
#[test]
fn given_run_operation_args_when_serialized_then_uses_macro_key() {
    // GIVEN
    let mut macro_args = Map::new();
    macro_args.insert("days".to_string(), json!(7));
    let args = RunOperationArgs {
        macro_name: "cleanup".to_string(),
        args: Some(macro_args),
    };

    // WHEN
    let params = to_params(&args).unwrap();

    // THEN
    assert_eq!(params["macro"], json!("cleanup"));
    assert_eq!(params["args"], json!({"days": 7}));
}
