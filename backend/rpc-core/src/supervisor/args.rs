//! Extraction of the supervisor's own flags from the server argument list.

use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;

const PORT_FLAG: &str = "--port";
const PORT_FLAG_PREFIX: &str = "--port=";
const EXISTING_FLAG: &str = "--existing";

/// Flags recognised by the supervisor plus the arguments forwarded to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerArgs {
    pub port: u16,
    pub existing: bool,
    /// Everything except `--existing`. `--port` stays: the server must listen on it.
    pub forwarded: Vec<String>,
}

#[track_caller]
fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidPort {
            location: ErrorLocation::from(Location::caller()),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Parse `--port N`, `--port=N` and `--existing` out of `args`.
///
/// Unknown arguments are forwarded untouched; the last `--port` wins.
#[track_caller]
pub fn parse_server_args(args: &[String], default_port: u16) -> Result<ServerArgs, ConfigError> {
    let mut port = default_port;
    let mut existing = false;
    let mut forwarded = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == EXISTING_FLAG {
            existing = true;
            continue;
        }

        if arg == PORT_FLAG {
            let value = iter.next().ok_or_else(|| ConfigError::InvalidPort {
                location: ErrorLocation::from(Location::caller()),
                value: String::new(),
                reason: format!("{PORT_FLAG} expects a value"),
            })?;
            port = parse_port(value)?;
            forwarded.push(arg.clone());
            forwarded.push(value.clone());
            continue;
        }

        if let Some(value) = arg.strip_prefix(PORT_FLAG_PREFIX) {
            port = parse_port(value)?;
        }

        forwarded.push(arg.clone());
    }

    Ok(ServerArgs {
        port,
        existing,
        forwarded,
    })
}
