use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded JSON-RPC response envelope.
///
/// `AsyncResult` is a successful result whose payload is a `request_token`
/// rather than a completed answer; the token must be polled until the task
/// reaches a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Result {
        id: Option<u64>,
        result: Value,
    },
    AsyncResult {
        id: Option<u64>,
        request_token: String,
        result: Value,
    },
    Error {
        id: Option<u64>,
        error: Value,
    },
}

impl RpcResponse {
    pub fn id(&self) -> Option<u64> {
        match self {
            RpcResponse::Result { id, .. }
            | RpcResponse::AsyncResult { id, .. }
            | RpcResponse::Error { id, .. } => *id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RpcResponse::Error { .. })
    }

    pub fn request_token(&self) -> Option<&str> {
        match self {
            RpcResponse::AsyncResult { request_token, .. } => Some(request_token),
            _ => None,
        }
    }
}

/// Typed view over the standard `error` member.
///
/// Servers may attach arbitrary `data`; it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorPayload {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorPayload {
    /// Reads `code` and `message` out of a raw error member, if it has them.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
