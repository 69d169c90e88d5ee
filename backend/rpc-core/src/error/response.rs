use common::ErrorLocation;

use serde_json::Value;
use thiserror::Error as ThisError;

/// A response envelope that is not what the caller asked for.
#[derive(Debug, ThisError)]
pub enum ResponseError {
    /// Malformed envelope, wrong protocol tag, id echo mismatch or missing member.
    #[error("Protocol Mismatch Error: {message} {location}")]
    ProtocolMismatch {
        message: String,
        response: Value,
        location: ErrorLocation,
    },

    /// Well-formed error reported by the server. `payload` is the raw `error` member.
    #[error("RPC Error: {message} {location}")]
    Rpc {
        message: String,
        payload: Value,
        location: ErrorLocation,
    },
}

impl ResponseError {
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ResponseError::Rpc { payload, .. } => Some(payload),
            ResponseError::ProtocolMismatch { .. } => None,
        }
    }
}
