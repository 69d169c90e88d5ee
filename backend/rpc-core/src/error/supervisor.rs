use crate::error::response::ResponseError;
use crate::error::transport::TransportError;

use common::ErrorLocation;

use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SupervisorError {
    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The server never became connectable. `output` holds what the process printed.
    #[error("Server Unavailable Error: {message} {location}")]
    ServerUnavailable {
        message: String,
        output: String,
        location: ErrorLocation,
    },

    /// The server answered `status` with a state outside the accepted set.
    #[error("Invalid Status Error: {message} {location}")]
    InvalidStatus {
        message: String,
        response: Value,
        output: String,
        location: ErrorLocation,
    },

    #[error("No Process Error: {message} {location}")]
    NoProcess {
        message: String,
        location: ErrorLocation,
    },

    #[error("Signal Error: {message} {location}")]
    Signal {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl SupervisorError {
    /// Output captured from the subprocess, for failures that carry it.
    pub fn output(&self) -> Option<&str> {
        match self {
            SupervisorError::ServerUnavailable { output, .. }
            | SupervisorError::InvalidStatus { output, .. } => Some(output),
            _ => None,
        }
    }
}
