use crate::error::response::ResponseError;
use crate::error::transport::TransportError;

use common::ErrorLocation;
use models::TaskState;

use std::time::Duration;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(
        "Poll Timeout Error: {message} (last state: {}, elapsed: {elapsed:?}) {location}",
        .last_state.as_ref().map(TaskState::as_str).unwrap_or("none")
    )]
    PollTimeout {
        message: String,
        last_state: Option<TaskState>,
        elapsed: Duration,
        location: ErrorLocation,
    },

    #[error("Params Error: {message} {location}")]
    Params {
        message: String,
        location: ErrorLocation,
    },
}
