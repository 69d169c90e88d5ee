use rpc_core::error::supervisor::SupervisorError;
use common::ErrorLocation;

use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;

use serde_json::json;

/// **VALUE**: Verifies that start failures expose the captured server output.
///
/// **WHY THIS MATTERS**: A failed start is usually a bad profile or project; the server's
/// own output is the only place that says which.
///
/// **BUG THIS CATCHES**: Would catch `output()` losing a variant that carries output.
#[test]
#[track_caller]
fn given_start_failures_when_output_requested_then_captured_text_returned() {
    // GIVEN
    let unavailable = SupervisorError::ServerUnavailable {
        message: "RPC server never appeared on 127.0.0.1:8580".to_string(),
        output: "Encountered an error:\nRuntime Error".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let invalid = SupervisorError::InvalidStatus {
        message: "Got invalid status result".to_string(),
        response: json!({"result": {"state": "error"}}),
        output: "Compilation Error".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let spawn = SupervisorError::Spawn {
        message: "Failed to spawn dbt".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::NotFound, "not found")),
    };

    // WHEN / THEN
    assert_eq!(unavailable.output(), Some("Encountered an error:\nRuntime Error"));
    assert_eq!(invalid.output(), Some("Compilation Error"));
    assert_eq!(spawn.output(), None);
}

/// **VALUE**: Verifies the Display format of supervisor errors includes the location.
#[test]
#[track_caller]
fn given_no_process_error_when_formatted_then_includes_type_and_location() {
    let err = SupervisorError::NoProcess {
        message: "No server process has been started".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let error_string = err.to_string();

    assert!(error_string.contains("No Process Error"));
    assert!(error_string.contains("supervisor.rs"));
}
