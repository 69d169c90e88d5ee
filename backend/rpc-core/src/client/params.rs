//! Typed, optional-by-default arguments for the RPC operations.
//!
//! Unset fields are skipped during serialization so the server sees the
//! param as absent, which it treats differently from an explicit `null`.

use crate::error::client::ClientError;

use common::ErrorLocation;

use std::panic::Location;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::{Map, Value};

/// A node selector: one spec string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Selector {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Selector {
    fn from(spec: &str) -> Self {
        Selector::One(spec.to_string())
    }
}

impl From<String> for Selector {
    fn from(spec: String) -> Self {
        Selector::One(spec)
    }
}

impl From<Vec<String>> for Selector {
    fn from(specs: Vec<String>) -> Self {
        Selector::Many(specs)
    }
}

impl From<Vec<&str>> for Selector {
    fn from(specs: Vec<&str>) -> Self {
        Selector::Many(specs.into_iter().map(str::to_string).collect())
    }
}

/// Task list filters. `None` leaves the filter out and the server decides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Active tasks only.
impl Default for PsArgs {
    fn default() -> Self {
        Self {
            active: Some(true),
            completed: Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollArgs {
    pub request_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_start: Option<u64>,
}

impl PollArgs {
    pub fn new(request_token: impl Into<String>) -> Self {
        Self {
            request_token: request_token.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GcArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<String>>,
    /// Timestamp before which completed tasks are collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
}

/// Node selection for `compile`, `run` and `build`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FreshnessArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Selector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    /// Run data tests only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<bool>,
    /// Run schema tests only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOperationArgs {
    #[serde(rename = "macro")]
    pub macro_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,
}

/// Raw SQL for `compile_sql` / `run_sql`. The text is base64-encoded on serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlArgs {
    #[serde(serialize_with = "serialize_base64")]
    pub sql: String,
    /// Result name tag; the method table supplies one when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extra macro definitions made available to the statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<String>,
}

impl SqlArgs {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_macros(mut self, macros: impl Into<String>) -> Self {
        self.macros = Some(macros.into());
        self
    }
}

fn serialize_base64<S>(sql: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&encode_sql(sql))
}

/// Base64 of the exact UTF-8 bytes of `sql`.
pub fn encode_sql(sql: &str) -> String {
    BASE64.encode(sql.as_bytes())
}

/// Serialize an args struct into a params object.
#[track_caller]
pub fn to_params<T: Serialize>(args: &T) -> Result<Map<String, Value>, ClientError> {
    match serde_json::to_value(args) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(other) => Err(ClientError::Params {
            message: format!("Params must serialize to an object, got {other}"),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(e) => Err(ClientError::Params {
            message: format!("Failed to serialize params: {e}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
