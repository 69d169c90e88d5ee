//! Row data returned by an executed SQL statement.

use crate::{ErrorLocation, ModelError};

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column names plus row tuples, as the server reports them under `results[0].table`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    /// Extracts the first result's `table` member from a completed `run_sql` result.
    #[track_caller]
    pub fn from_sql_result(result: &Value) -> Result<Self, ModelError> {
        let table = result
            .pointer("/results/0/table")
            .ok_or_else(|| ModelError::Decode {
                message: format!("Result has no results[0].table member: {result}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        serde_json::from_value(table.clone()).map_err(|e| ModelError::Decode {
            message: format!("Malformed result table: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Each row keyed by column name. Extra cells beyond the column list are dropped.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.column_names
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}
