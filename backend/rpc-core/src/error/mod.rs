pub mod client;
pub mod config;
pub mod response;
pub mod session;
pub mod supervisor;
pub mod transport;
