use crate::error::client::ClientError;
use crate::error::config::ConfigError;
use crate::error::supervisor::SupervisorError;

use common::ErrorLocation;
use models::ModelError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("No Server Error: {message} {location}")]
    NoServer {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unexpected Result Error: {message} {location}")]
    UnexpectedResult {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
