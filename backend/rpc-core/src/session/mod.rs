//! Per-conversation context handed to interactive front ends.
//!
//! A [`Session`] owns at most one managed server and the client talking to
//! it, plus the last SQL result it produced. Independent sessions share
//! nothing, so several can coexist in one process.

use crate::client::{PollSettings, RpcClient, SqlArgs};
use crate::config::RpcConfig;
use crate::error::config::ConfigError;
use crate::error::session::SessionError;
use crate::supervisor::{ProcessSignal, ProcessSupervisor};

use common::ErrorLocation;
use models::ResultTable;

use std::panic::Location;

use log::{debug, info};
use serde_json::Value;

const READY_STATE: &str = "ready";
const RUN_SQL_ALIAS: &str = "dbt_run_sql";

/// The most recent SQL outcome, kept for export by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum LastResult {
    Table(ResultTable),
    Sql(String),
}

#[derive(Debug)]
struct ActiveServer {
    supervisor: ProcessSupervisor,
    client: RpcClient,
}

#[derive(Debug)]
pub struct Session {
    config: RpcConfig,
    server: Option<ActiveServer>,
    last_result: Option<LastResult>,
}

/// Wrap `sql` so the server returns at most `max_rows` rows.
pub fn limit_query(sql: &str, max_rows: u32) -> String {
    format!("select * from ({sql}) {RUN_SQL_ALIAS} limit {max_rows}")
}

impl Session {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            server: None,
            last_result: None,
        }
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.server.is_some()
    }

    pub fn last_result(&self) -> Option<&LastResult> {
        self.last_result.as_ref()
    }

    /// Start (or attach to) a server, stopping any server this session managed before.
    ///
    /// `args` follow the binary name, e.g. `["rpc", "--port", "8581"]`.
    pub async fn start(&mut self, args: &[String]) -> Result<(), SessionError> {
        self.stop().await;

        let mut supervisor = ProcessSupervisor::configure(args, &self.config)?;
        supervisor.start().await?;

        let client = RpcClient::new(supervisor.transport().clone())
            .with_poll_settings(PollSettings::from(&self.config.poll));

        info!(
            "Session connected to {}",
            supervisor.transport().endpoint()
        );
        self.server = Some(ActiveServer { supervisor, client });
        Ok(())
    }

    /// Shell-style word splitting of a start line.
    #[track_caller]
    pub fn split_line(line: &str) -> Result<Vec<String>, ConfigError> {
        shlex::split(line).ok_or_else(|| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Unbalanced quoting in '{line}'"),
        })
    }

    /// [`Session::start`] with the arguments given as one line, e.g. `rpc --port 8581`.
    pub async fn start_line(&mut self, line: &str) -> Result<(), SessionError> {
        let args = Self::split_line(line)?;
        self.start(&args).await
    }

    /// Stop the managed server. Never fails; a no-op when nothing is running.
    pub async fn stop(&mut self) {
        if let Some(mut server) = self.server.take() {
            debug!("Stopping session server on port {}", server.supervisor.port());
            server.supervisor.stop().await;
        }
    }

    #[track_caller]
    pub fn client(&mut self) -> Result<&mut RpcClient, SessionError> {
        self.server
            .as_mut()
            .map(|server| &mut server.client)
            .ok_or_else(|| SessionError::NoServer {
                message: String::from("No RPC server started in this session"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    pub fn supervisor(&self) -> Result<&ProcessSupervisor, SessionError> {
        self.server
            .as_ref()
            .map(|server| &server.supervisor)
            .ok_or_else(|| SessionError::NoServer {
                message: String::from("No RPC server started in this session"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Execute `sql` (row-limited) and keep the rows as the last result.
    pub async fn run_sql(&mut self, sql: &str) -> Result<ResultTable, SessionError> {
        let query = limit_query(sql, self.config.sql.max_rows);
        let args = SqlArgs::new(query).with_name(self.config.sql.run_name.as_str());

        let client = self.client()?;
        let exchange = client.run_sql(args).await?;
        let result = client.async_wait_for_result(&exchange, None).await?;

        let table = ResultTable::from_sql_result(&result)?;
        debug!("run_sql returned {} rows", table.len());

        self.last_result = Some(LastResult::Table(table.clone()));
        Ok(table)
    }

    /// Compile `sql` and keep the compiled text as the last result.
    pub async fn compile_sql(&mut self, sql: &str) -> Result<String, SessionError> {
        let args = SqlArgs::new(sql).with_name(self.config.sql.compile_name.as_str());

        let client = self.client()?;
        let exchange = client.compile_sql(args).await?;
        let result = client.async_wait_for_result(&exchange, None).await?;

        let compiled = result
            .pointer("/results/0/compiled_sql")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SessionError::UnexpectedResult {
                message: format!("compile_sql result has no results[0].compiled_sql: {result}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.last_result = Some(LastResult::Sql(compiled.clone()));
        Ok(compiled)
    }

    /// Ask the managed server to reload its project, then wait until it is ready again.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the server did not report ready within the readiness budget.
    pub async fn reload(&mut self) -> Result<bool, SessionError> {
        let attempts = self.config.readiness.attempts;

        self.supervisor()?.send_signal(ProcessSignal::Hangup)?;
        info!("Sent reload signal to RPC server");

        Ok(self.client()?.wait_for_status(READY_STATE, attempts).await?)
    }
}
