use rpc_core::error::client::ClientError;
use rpc_core::error::response::ResponseError;
use common::ErrorLocation;
use models::TaskState;

use std::panic::Location;
use std::time::Duration;

use serde_json::json;

/// **VALUE**: Verifies that `ClientError::PollTimeout` reports the last state and location.
///
/// **WHY THIS MATTERS**: "Timed out" alone does not say whether the task was still running
/// or stuck in an unexpected state.
///
/// **BUG THIS CATCHES**: Would catch the last state or location dropping out of Display.
#[test]
#[track_caller]
fn given_poll_timeout_when_formatted_then_includes_last_state_and_location() {
    // GIVEN
    let err = ClientError::PollTimeout {
        message: "Task tok-1 never reached 'success' within 2s".to_string(),
        last_state: Some(TaskState::Running),
        elapsed: Duration::from_millis(2100),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN
    let error_string = err.to_string();

    // THEN
    assert!(error_string.contains("Poll Timeout Error"));
    assert!(error_string.contains("last state: running"));
    assert!(error_string.contains("client.rs"));
}

/// **VALUE**: Verifies that a timeout before any state was seen reads "none".
#[test]
#[track_caller]
fn given_poll_timeout_without_state_when_formatted_then_reports_none() {
    let err = ClientError::PollTimeout {
        message: "never polled".to_string(),
        last_state: None,
        elapsed: Duration::ZERO,
        location: ErrorLocation::from(Location::caller()),
    };

    assert!(err.to_string().contains("last state: none"));
}

/// **VALUE**: Verifies that wrapped response errors are transparent.
///
/// **BUG THIS CATCHES**: Would catch a wrapper prefix hiding the server's message.
#[test]
#[track_caller]
fn given_rpc_error_when_wrapped_then_display_unchanged() {
    // GIVEN
    let inner = ResponseError::Rpc {
        message: "server error 10011: RPC timeout".to_string(),
        payload: json!({"code": 10011, "message": "RPC timeout"}),
        location: ErrorLocation::from(Location::caller()),
    };
    let expected = inner.to_string();

    // WHEN
    let wrapped = ClientError::from(inner);

    // THEN
    assert_eq!(wrapped.to_string(), expected);
    assert!(expected.starts_with("RPC Error: server error 10011"));
}
