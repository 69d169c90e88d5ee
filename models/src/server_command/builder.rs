use crate::error::model_error::ModelError;
use crate::{ErrorLocation, ServerCommand};

use std::panic::Location;

/// Builder for creating validated ServerCommand instances.
#[derive(Debug, Default)]
pub struct ServerCommandBuilder {
    program: Option<String>,
    args: Vec<String>,
    host: Option<String>,
    port: Option<u16>,
    existing: bool,
}

impl ServerCommandBuilder {
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_existing(mut self, existing: bool) -> Self {
        self.existing = existing;
        self
    }

    /// Build the ServerCommand with validation.
    #[track_caller]
    pub fn build(self) -> Result<ServerCommand, ModelError> {
        let program = self.program.ok_or_else(|| ModelError::Validation {
            message: String::from("Program is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if program.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Program cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let host = self.host.ok_or_else(|| ModelError::Validation {
            message: String::from("Host is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if host.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Host cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if port == 0 {
            return Err(ModelError::Validation {
                message: String::from("Port must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(ServerCommand {
            program,
            args: self.args,
            host,
            port,
            existing: self.existing,
        })
    }
}
