// Unit tests for logger initialization.
// Only one test installs the global logger; the failure path never reaches `apply`.

use crate::error::ConsoleError;
use crate::logger::{initialize, initialize_internal};

use std::path::PathBuf;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: fern errors when a global logger is set twice; a second call
/// from another code path must not abort startup.
///
/// **BUG THIS CATCHES**: Would catch the Once or AtomicBool guards being removed.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A writable temporary directory
    let temp_dir = tempfile::tempdir().unwrap();

    // WHEN: Calling initialize twice
    let first = initialize(temp_dir.path());
    let second = initialize(temp_dir.path());

    // THEN
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: Verifies that an unusable log directory is reported, not a panic.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` being unwrapped.
#[test]
fn given_invalid_log_dir_when_initialize_internal_then_console_error() {
    // GIVEN: A path under a file, which can never be a directory
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN
    let result = initialize_internal(&invalid_dir);

    // THEN
    match result {
        Err(ConsoleError::Console { message, .. }) => {
            assert!(message.contains("Failed to create log file"));
        }
        other => panic!("Expected Console error, got {other:?}"),
    }
}
