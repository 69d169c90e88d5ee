use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};

/// State of a server-side task (or of the server itself) as reported by `poll`/`status`.
///
/// The vocabulary belongs to the server. Unknown states are preserved verbatim
/// so callers can still compare them against a target state string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    Running,
    Success,
    Error,
    Killed,
    Ready,
    Other(String),
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Running => "running",
            TaskState::Success => "success",
            TaskState::Error => "error",
            TaskState::Killed => "killed",
            TaskState::Ready => "ready",
            TaskState::Other(state) => state,
        }
    }

    /// No further transitions happen after a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Success | TaskState::Error | TaskState::Killed
        )
    }

    pub fn matches(&self, target: &str) -> bool {
        self.as_str() == target
    }
}

impl From<&str> for TaskState {
    fn from(state: &str) -> Self {
        match state {
            "running" => TaskState::Running,
            "success" => TaskState::Success,
            "error" => TaskState::Error,
            "killed" => TaskState::Killed,
            "ready" => TaskState::Ready,
            other => TaskState::Other(other.to_string()),
        }
    }
}

impl From<String> for TaskState {
    fn from(state: String) -> Self {
        TaskState::from(state.as_str())
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        state.as_str().to_string()
    }
}

impl Display for TaskState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
