mod client;
mod error;
mod helpers;
mod poll;
mod readiness;
mod session;
mod supervisor;
mod transport;
