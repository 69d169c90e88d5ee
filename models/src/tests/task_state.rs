use crate::TaskState;

/// **VALUE**: Verifies that unknown server states survive a decode/encode cycle verbatim.
///
/// **WHY THIS MATTERS**: The server owns the state vocabulary. Poll loops compare the
/// observed state against a caller-supplied target string, so an unknown state must not
/// be collapsed into a known one.
///
/// **BUG THIS CATCHES**: Would catch a catch-all mapping unknown states to `Error`.
#[test]
fn given_unknown_state_when_deserialized_then_preserved_as_other() {
    // GIVEN: A poll result with a state this client does not know
    let raw = serde_json::json!("compiling");

    // WHEN: Deserializing
    let state: TaskState = serde_json::from_value(raw).expect("string state");

    // THEN: The original text is kept and compares equal to itself
    assert_eq!(state, TaskState::Other("compiling".to_string()));
    assert!(state.matches("compiling"));
    assert!(!state.is_terminal());
    assert_eq!(serde_json::to_value(&state).unwrap(), "compiling");
}

/// **VALUE**: Verifies the terminal state set.
///
/// **WHY THIS MATTERS**: `success`, `error` and `killed` end a task; `running` and the
/// server-level `ready` do not.
///
/// **BUG THIS CATCHES**: Would catch if `running` were treated as terminal.
#[test]
fn given_known_states_when_checked_then_terminal_set_is_success_error_killed() {
    // GIVEN / WHEN / THEN
    assert!(TaskState::from("success").is_terminal());
    assert!(TaskState::from("error").is_terminal());
    assert!(TaskState::from("killed").is_terminal());
    assert!(!TaskState::from("running").is_terminal());
    assert!(!TaskState::from("ready").is_terminal());
    assert_eq!(TaskState::Killed.to_string(), "killed");
}
