use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error in the workspace embeds an ErrorLocation. If capture
/// breaks, supervisor and RPC failures lose the only pointer to where they were raised.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated or
/// the line/column fields are swapped.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: The location of this very line
    let expected_line = line!() + 3;

    // WHEN: Creating ErrorLocation from caller
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture file, line, and column
    assert!(location.file.contains("error_location.rs"));
    assert_eq!(location.line, expected_line);
    assert!(location.column > 0);
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` Display format.
///
/// **WHY THIS MATTERS**: Every error variant renders `{message} {location}`; a format
/// change silently alters every error string surfaced to callers.
///
/// **BUG THIS CATCHES**: Would catch if brackets or separators are dropped.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "supervisor.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Should produce "[file:line:column]"
    assert_eq!(formatted, "[supervisor.rs:42:7]");
}
