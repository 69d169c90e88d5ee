use crate::{ModelError, ResultTable};

use serde_json::json;

/// **VALUE**: Verifies that a `run_sql` result is unpacked into columns and rows.
///
/// **WHY THIS MATTERS**: The session hands this table to external renderers; the column
/// order and cell values must match what the server returned.
///
/// **BUG THIS CATCHES**: Would catch a wrong JSON pointer or rows zipped to wrong columns.
#[test]
fn given_run_sql_result_when_extracting_table_then_returns_columns_and_records() {
    // GIVEN: A completed run_sql result payload
    let result = json!({
        "state": "success",
        "results": [{
            "table": {
                "column_names": ["id", "name"],
                "rows": [[1, "alpha"], [2, "beta"]]
            }
        }]
    });

    // WHEN: Extracting the table
    let table = ResultTable::from_sql_result(&result).expect("table present");

    // THEN: Columns, rows and keyed records line up
    assert_eq!(table.column_names, vec!["id", "name"]);
    assert_eq!(table.len(), 2);
    let records = table.records();
    assert_eq!(records[1]["name"], json!("beta"));
    assert_eq!(records[0]["id"], json!(1));
}

/// **VALUE**: Verifies that a result without a table is a decode error, not a panic.
///
/// **WHY THIS MATTERS**: A compile-only result has `compiled_sql` but no `table`.
///
/// **BUG THIS CATCHES**: Would catch an indexing panic on missing `results`.
#[test]
fn given_result_without_table_when_extracting_then_returns_decode_error() {
    // GIVEN: A result lacking results[0].table
    let result = json!({"results": [{"compiled_sql": "select 1"}]});

    // WHEN: Extracting the table
    let outcome = ResultTable::from_sql_result(&result);

    // THEN: A decode error is returned
    assert!(matches!(outcome, Err(ModelError::Decode { .. })));
}
