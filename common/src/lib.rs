//! Primitives shared by every crate in the dbt RPC workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking, HTTP status helpers
//! - **models**: pure data exchanged with the RPC server
//! - **rpc-core**: process supervision, transport and the typed RPC client
//! - **dbt-rpc-console**: line-oriented driver wiring everything together

pub mod error;
pub mod http_status;

pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;

#[cfg(test)]
mod tests;
