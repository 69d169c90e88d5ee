//! Domain models for the dbt RPC client.
//!
//! This crate contains pure data structures exchanged with the RPC server
//! and describing the managed server process. Models carry no I/O - they're
//! just data that can be passed between layers.
//!
//! ## Architecture
//!
//! - **models** (this crate): Pure data structures
//! - **rpc-core**: Process supervision and RPC logic operating on models
//! - **dbt-rpc-console**: Application wiring everything together

pub mod error;
pub mod result_table;
pub mod rpc;
pub mod server_command;
pub mod task_state;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use result_table::ResultTable;
pub use rpc::request::{JSONRPC_VERSION, RpcRequest};
pub use rpc::response::{RpcErrorPayload, RpcResponse};
pub use server_command::ServerCommand;
pub use server_command::builder::ServerCommandBuilder;
pub use task_state::TaskState;

#[cfg(test)]
mod tests;
