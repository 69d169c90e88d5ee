//! Table of known RPC methods and their parameter schemas.
//!
//! Methods are data, not types: a new server operation is one more
//! [`MethodSpec`] row. Methods missing from the table are still callable
//! through [`super::RpcClient::request`]; their params are sent as given.

use crate::error::client::ClientError;

use common::ErrorLocation;

use std::panic::Location;

use log::debug;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// String values filled in when the caller leaves the param out.
    pub defaults: &'static [(&'static str, &'static str)],
    /// The server answers with a `request_token` to poll instead of a result.
    pub asynchronous: bool,
}

pub const STATUS: &str = "status";
pub const PS: &str = "ps";
pub const KILL: &str = "kill";
pub const POLL: &str = "poll";
pub const GC: &str = "gc";
pub const CLI_ARGS: &str = "cli_args";
pub const DEPS: &str = "deps";
pub const BUILD: &str = "build";
pub const COMPILE: &str = "compile";
pub const RUN: &str = "run";
pub const RUN_OPERATION: &str = "run-operation";
pub const SEED: &str = "seed";
pub const SNAPSHOT: &str = "snapshot";
pub const SNAPSHOT_FRESHNESS: &str = "snapshot-freshness";
pub const TEST: &str = "test";
pub const DOCS_GENERATE: &str = "docs.generate";
pub const COMPILE_SQL: &str = "compile_sql";
pub const RUN_SQL: &str = "run_sql";
pub const GET_MANIFEST: &str = "get-manifest";

const SELECTION: &[&str] = &["models", "select", "exclude", "threads"];
const SQL_PARAMS: &[&str] = &["macros"];

pub const METHODS: &[MethodSpec] = &[
    MethodSpec {
        name: STATUS,
        required: &[],
        optional: &[],
        defaults: &[],
        asynchronous: false,
    },
    MethodSpec {
        name: PS,
        required: &[],
        optional: &["active", "completed"],
        defaults: &[],
        asynchronous: false,
    },
    MethodSpec {
        name: KILL,
        required: &["task_id"],
        optional: &[],
        defaults: &[],
        asynchronous: false,
    },
    MethodSpec {
        name: POLL,
        required: &["request_token"],
        optional: &["logs", "logs_start"],
        defaults: &[],
        asynchronous: false,
    },
    MethodSpec {
        name: GC,
        required: &[],
        optional: &["task_ids", "before", "settings"],
        defaults: &[],
        asynchronous: false,
    },
    MethodSpec {
        name: CLI_ARGS,
        required: &["cli"],
        optional: &[],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: DEPS,
        required: &[],
        optional: &[],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: BUILD,
        required: &[],
        optional: SELECTION,
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: COMPILE,
        required: &[],
        optional: SELECTION,
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: RUN,
        required: &[],
        optional: SELECTION,
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: RUN_OPERATION,
        required: &["macro"],
        optional: &["args"],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: SEED,
        required: &[],
        optional: &["select", "exclude", "show", "threads"],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: SNAPSHOT,
        required: &[],
        optional: &["select", "exclude", "threads"],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: SNAPSHOT_FRESHNESS,
        required: &[],
        optional: &["select", "threads"],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: TEST,
        required: &[],
        optional: &["models", "exclude", "threads", "data", "schema"],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: DOCS_GENERATE,
        required: &[],
        optional: &["compile"],
        defaults: &[],
        asynchronous: true,
    },
    MethodSpec {
        name: COMPILE_SQL,
        required: &["sql", "name"],
        optional: SQL_PARAMS,
        defaults: &[("name", "test_compile")],
        asynchronous: true,
    },
    MethodSpec {
        name: RUN_SQL,
        required: &["sql", "name"],
        optional: SQL_PARAMS,
        defaults: &[("name", "test_run")],
        asynchronous: true,
    },
    MethodSpec {
        name: GET_MANIFEST,
        required: &[],
        optional: &[],
        defaults: &[],
        asynchronous: true,
    },
];

pub fn lookup(name: &str) -> Option<&'static MethodSpec> {
    METHODS.iter().find(|spec| spec.name == name)
}

impl MethodSpec {
    /// Fill defaults for absent params, then check that every required param is present.
    ///
    /// Params absent after defaulting stay absent; nothing is sent as `null`.
    #[track_caller]
    pub fn prepare(&self, mut params: Map<String, Value>) -> Result<Map<String, Value>, ClientError> {
        for (key, default) in self.defaults {
            if !params.contains_key(*key) {
                params.insert((*key).to_string(), Value::String((*default).to_string()));
            }
        }

        if let Some(missing) = self
            .required
            .iter()
            .find(|key| params.get(**key).is_none_or(Value::is_null))
        {
            return Err(ClientError::Params {
                message: format!("'{}' requires param '{missing}'", self.name),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        for key in params.keys() {
            if !self.required.contains(&key.as_str()) && !self.optional.contains(&key.as_str()) {
                debug!("'{}' called with unlisted param '{key}'", self.name);
            }
        }

        Ok(params)
    }
}
