//! Client library for a dbt RPC server.
//!
//! Launches (or attaches to) a `dbt rpc` subprocess, waits until it reports a
//! ready state, and drives JSON-RPC 2.0 calls against it, including the
//! poll-until-terminal-state protocol used by long-running tasks.
//!
//! Every call blocks its caller until the server answers; nothing runs in the
//! background except the readers draining the subprocess output. A [`session::Session`]
//! drives one server conversation at a time and is not meant to be shared between
//! concurrent callers: its operations take `&mut self`.

pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod readiness;
pub mod session;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
mod tests;

pub const DBT_BINARY: &str = "dbt";
pub const RPC_SERVER_HOSTNAME: &str = "localhost";
pub const RPC_DEFAULT_PORT: u16 = 8580;
pub const RPC_ENDPOINT_PATH: &str = "jsonrpc";
pub const RPC_DEFAULT_URL: &str = const_format::concatcp!(
    "http://",
    RPC_SERVER_HOSTNAME,
    ":",
    RPC_DEFAULT_PORT,
    "/",
    RPC_ENDPOINT_PATH
);
