//! Description of the RPC server subprocess: what to run and where it listens.

pub mod builder;

use serde::Serialize;

/// Validated launch/attach description for one RPC server.
///
/// Built through [`builder::ServerCommandBuilder`]. When `existing` is set the
/// server is assumed to be running already and is never spawned or terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerCommand {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) existing: bool,
}

impl ServerCommand {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn existing(&self) -> bool {
        self.existing
    }

    /// `<program> <args...>` joined for logs and diagnostics.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
