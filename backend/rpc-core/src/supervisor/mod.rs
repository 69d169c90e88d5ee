//! Lifecycle of the RPC server subprocess.
//!
//! A [`ProcessSupervisor`] either spawns `<binary> <args...>` or, with
//! `--existing`, attaches to a server somebody else started. Only a process it
//! spawned itself is ever signalled or terminated.

pub mod args;
pub mod output;

use crate::config::RpcConfig;
use crate::error::config::ConfigError;
use crate::error::supervisor::SupervisorError;
use crate::readiness::ReadinessProbe;
use crate::supervisor::args::parse_server_args;
use crate::supervisor::output::{CapturedOutput, capture};
use crate::transport::RpcTransport;

use common::ErrorLocation;
use models::{ServerCommand, ServerCommandBuilder};

use std::panic::Location;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, warn};
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;
use tokio::time::timeout as TokioTimeout;

const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// OS signals the supervisor can deliver to its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    /// Asks the server to reload its project configuration.
    Hangup,
    Interrupt,
    Terminate,
    Kill,
}

impl From<ProcessSignal> for Signal {
    fn from(signal: ProcessSignal) -> Self {
        match signal {
            ProcessSignal::Hangup => Signal::Hangup,
            ProcessSignal::Interrupt => Signal::Interrupt,
            ProcessSignal::Terminate => Signal::Term,
            ProcessSignal::Kill => Signal::Kill,
        }
    }
}

/// Deliver `signal` to `pid`. Returns whether the OS accepted it.
pub(crate) fn deliver_signal(pid: u32, signal: Signal) -> bool {
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid)
        .and_then(|p| p.kill_with(signal))
        .unwrap_or(false)
}

pub(crate) fn build_spawn_command(command: &ServerCommand) -> TokioCommand {
    let mut cmd = TokioCommand::new(command.program());
    cmd.args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

#[derive(Debug)]
pub struct ProcessSupervisor {
    command: ServerCommand,
    transport: RpcTransport,
    probe: ReadinessProbe,
    child: Option<TokioChild>,
    output: CapturedOutput,
    readers: Vec<JoinHandle<()>>,
}

impl ProcessSupervisor {
    /// Build a supervisor from the user-supplied server arguments.
    ///
    /// `args` is what follows the binary name, e.g. `["rpc", "--port", "8581"]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] if `--port` is not a valid port number.
    #[track_caller]
    pub fn configure(args: &[String], config: &RpcConfig) -> Result<Self, ConfigError> {
        let parsed = parse_server_args(args, config.default_port)?;

        let command = ServerCommandBuilder::default()
            .with_program(config.binary.as_str())
            .with_args(parsed.forwarded)
            .with_host(config.host.as_str())
            .with_port(parsed.port)
            .with_existing(parsed.existing)
            .build()
            .map_err(|e| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })?;

        Self::from_command(command, config)
    }

    #[track_caller]
    pub fn from_command(command: ServerCommand, config: &RpcConfig) -> Result<Self, ConfigError> {
        let transport =
            RpcTransport::for_server(command.host(), command.port(), config.request_timeout())
                .map_err(|e| ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Invalid RPC endpoint: {e}"),
                })?;

        let probe = ReadinessProbe::new(transport.clone(), command.host(), command.port(), config);

        Ok(Self {
            command,
            transport,
            probe,
            child: None,
            output: CapturedOutput::default(),
            readers: Vec::new(),
        })
    }

    pub fn command(&self) -> &ServerCommand {
        &self.command
    }

    pub fn transport(&self) -> &RpcTransport {
        &self.transport
    }

    pub fn port(&self) -> u16 {
        self.command.port()
    }

    pub fn is_existing(&self) -> bool {
        self.command.existing()
    }

    /// PID of the process this supervisor spawned, if it is still owned.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(TokioChild::id)
    }

    pub fn is_spawned(&self) -> bool {
        self.child.is_some()
    }

    /// Merged stdout/stderr captured from the spawned process so far.
    pub fn output(&self) -> String {
        self.output.snapshot()
    }

    /// Spawn the server process with output captured. Does not wait for readiness.
    pub fn run(&mut self) -> Result<u32, SupervisorError> {
        let command_line = self.command.command_line();
        debug!("Spawning {command_line}");

        let mut child = build_spawn_command(&self.command)
            .spawn()
            .map_err(|e| SupervisorError::Spawn {
                message: format!("Failed to spawn {command_line}: {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(e),
            })?;

        self.output.clear();
        if let Some(stdout) = child.stdout.take() {
            self.readers
                .push(capture(stdout, self.output.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            self.readers
                .push(capture(stderr, self.output.clone(), "stderr"));
        }

        let pid = child.id().unwrap_or_default();
        info!("Spawned {command_line} (PID: {pid})");

        self.child = Some(child);
        Ok(pid)
    }

    /// Spawn (unless attaching) and wait until the server reports a ready state.
    ///
    /// A process spawned by a failed start is stopped before the error is returned.
    ///
    /// # Errors
    ///
    /// * [`SupervisorError::Spawn`] - the binary could not be started
    /// * [`SupervisorError::ServerUnavailable`] - never connectable within the attempt budget
    /// * [`SupervisorError::InvalidStatus`] - reachable, but `status` is not a ready state
    /// * [`SupervisorError::Transport`] - the final `status` call failed
    pub async fn start(&mut self) -> Result<(), SupervisorError> {
        if self.child.is_some() {
            warn!("Supervisor already owns a server process, stopping it first");
            self.stop().await;
        }

        if self.command.existing() {
            info!(
                "Attaching to existing RPC server on {}:{}",
                self.command.host(),
                self.command.port()
            );
        } else {
            self.run()?;
        }

        // Reachable but not ready falls through to the status check below.
        let up = self.probe.wait_until_up().await;
        if !up && !self.probe.is_reachable().await {
            let output = self.abandon_start().await;
            return Err(SupervisorError::ServerUnavailable {
                message: format!(
                    "RPC server never appeared on {}:{}",
                    self.command.host(),
                    self.command.port()
                ),
                output,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let response = match self.probe.status().await {
            Ok(response) => response,
            Err(e) => {
                self.abandon_start().await;
                return Err(e);
            }
        };

        if !self.probe.is_ready_response(&response) {
            let output = self.abandon_start().await;
            return Err(SupervisorError::InvalidStatus {
                message: format!("Got invalid status result: {response}"),
                response,
                output,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("RPC server ready at {}", self.transport.endpoint());
        Ok(())
    }

    /// Stop whatever this failed start spawned and return the captured output.
    async fn abandon_start(&mut self) -> String {
        self.stop().await;
        self.output.snapshot()
    }

    /// Terminate and reap the spawned process.
    ///
    /// No-op when nothing was spawned (never started, or attached to an existing
    /// server). Safe to call any number of times; failures are only logged.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            debug!("Stop requested but no owned server process");
            return;
        };

        match child.id() {
            Some(pid) => {
                if deliver_signal(pid, Signal::Term) {
                    debug!("Sent SIGTERM to PID {pid}");
                } else if let Err(e) = child.start_kill() {
                    warn!("Failed to kill PID {pid}: {e}");
                }
            }
            None => debug!("Server process already exited"),
        }

        match child.wait().await {
            Ok(status) => info!("RPC server exited: {status}"),
            Err(e) => warn!("Failed to wait for RPC server exit: {e}"),
        }

        self.drain_readers().await;
    }

    async fn drain_readers(&mut self) {
        for reader in self.readers.drain(..) {
            if TokioTimeout(OUTPUT_DRAIN_TIMEOUT, reader).await.is_err() {
                debug!("Output reader still open after {OUTPUT_DRAIN_TIMEOUT:?}, abandoning");
            }
        }
    }

    pub async fn is_reachable(&self) -> bool {
        self.probe.is_reachable().await
    }

    pub async fn status_ok(&self) -> bool {
        self.probe.status_ok().await
    }

    pub async fn is_up(&self) -> bool {
        self.probe.is_up().await
    }

    /// Deliver `signal` to the spawned server (e.g. [`ProcessSignal::Hangup`] to reload).
    ///
    /// # Errors
    ///
    /// * [`SupervisorError::NoProcess`] - nothing spawned, or attached to an existing server
    /// * [`SupervisorError::Signal`] - the OS refused the signal
    #[track_caller]
    pub fn send_signal(&self, signal: ProcessSignal) -> Result<(), SupervisorError> {
        let pid = self.pid().ok_or_else(|| SupervisorError::NoProcess {
            message: if self.command.existing() {
                String::from("Attached to an existing server; it is not ours to signal")
            } else {
                String::from("No server process has been started")
            },
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !deliver_signal(pid, signal.into()) {
            return Err(SupervisorError::Signal {
                message: format!("Failed to deliver {signal:?} to PID {pid}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        debug!("Delivered {signal:?} to PID {pid}");
        Ok(())
    }
}
