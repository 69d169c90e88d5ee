use crate::{ModelError, ServerCommandBuilder};

fn valid_builder() -> ServerCommandBuilder {
    ServerCommandBuilder::default()
        .with_program("dbt")
        .with_args(["rpc", "--port", "8580"])
        .with_host("localhost")
        .with_port(8580)
}

/// **VALUE**: Verifies that builder validation rejects a zero port.
///
/// **WHY THIS MATTERS**: Port 0 asks the OS for any free port; the supervisor would then
/// probe a port nobody listens on and report the server as unavailable.
///
/// **BUG THIS CATCHES**: Would catch if the port check is dropped during refactoring.
#[test]
fn given_zero_port_when_building_server_command_then_returns_validation_error() {
    // GIVEN: Builder with port set to zero
    let builder = valid_builder().with_port(0);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Port must be non-zero");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects a missing program.
///
/// **WHY THIS MATTERS**: Without a program the supervisor has nothing to spawn.
///
/// **BUG THIS CATCHES**: Would catch if required field validation is removed.
#[test]
fn given_missing_program_when_building_then_returns_validation_error() {
    // GIVEN: Builder without a program
    let builder = ServerCommandBuilder::default()
        .with_host("localhost")
        .with_port(8580);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Program is required");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies the happy path and the command line used in diagnostics.
///
/// **WHY THIS MATTERS**: The command line is what appears in spawn logs and errors; it
/// must reflect exactly what is executed.
///
/// **BUG THIS CATCHES**: Would catch if args are reordered or the program is dropped.
#[test]
fn given_valid_fields_when_building_then_returns_command_with_joined_command_line() {
    // GIVEN: A fully populated builder in attach mode
    let builder = valid_builder().with_existing(true);

    // WHEN: Building
    let command = builder.build().expect("valid command");

    // THEN: Fields and command line match
    assert_eq!(command.program(), "dbt");
    assert_eq!(command.port(), 8580);
    assert!(command.existing());
    assert_eq!(command.command_line(), "dbt rpc --port 8580");
}
