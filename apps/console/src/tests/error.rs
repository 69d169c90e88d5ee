// Unit tests for error module

use crate::error::ConsoleError;

use common::ErrorLocation;
use rpc_core::error::session::SessionError;
use rpc_core::error::supervisor::SupervisorError;

use std::panic::Location;

/// **VALUE**: Verifies that server output captured by a failed start reaches the console.
///
/// **WHY THIS MATTERS**: The console prints it under the error so users see why dbt
/// refused to start.
///
/// **BUG THIS CATCHES**: Would catch `server_output()` not looking through the session
/// and supervisor wrappers.
#[test]
fn given_wrapped_unavailable_error_when_server_output_then_returns_captured_text() {
    // GIVEN
    let err = ConsoleError::from(SessionError::from(SupervisorError::ServerUnavailable {
        message: "RPC server never appeared".to_string(),
        output: "Could not find profile named 'warehouse'".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }));

    // WHEN / THEN
    assert_eq!(
        err.server_output(),
        Some("Could not find profile named 'warehouse'")
    );
    assert!(err.to_string().contains("Server Unavailable Error"));
}

/// **VALUE**: Verifies that errors without captured output report none.
#[test]
fn given_command_error_when_server_output_then_none() {
    let err = ConsoleError::Command {
        message: "Unknown command 'lol'".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    assert_eq!(err.server_output(), None);
    assert!(err.to_string().starts_with("Command Error: Unknown command"));
}
