use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// A single JSON-RPC 2.0 request envelope.
///
/// One is built per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    jsonrpc: String,
    method: String,
    params: Map<String, Value>,
    id: u64,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Map<String, Value>, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}
