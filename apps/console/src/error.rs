use common::ErrorLocation;

use rpc_core::error::client::ClientError;
use rpc_core::error::config::ConfigError;
use rpc_core::error::response::ResponseError;
use rpc_core::error::session::SessionError;

use thiserror::Error;

/// Errors surfaced by the console front end.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Error from this app (logging, terminal I/O)
    #[error("Console Error: {message} {location}")]
    Console {
        message: String,
        location: ErrorLocation,
    },

    /// A line that is not a known command, or is missing its argument
    #[error("Command Error: {message} {location}")]
    Command {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error from the RPC session (start, SQL, reload)
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Error from a direct client call
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl ConsoleError {
    /// Server output captured by a failed start, if this error carries any.
    pub fn server_output(&self) -> Option<&str> {
        match self {
            ConsoleError::Session(SessionError::Supervisor(e)) => e.output(),
            _ => None,
        }
    }
}
