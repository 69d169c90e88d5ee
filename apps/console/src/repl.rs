//! Line-oriented command loop over one [`Session`].
//!
//! Each input line is one command; results go to the given writer as plain
//! text (tables tab-separated) so the output can be piped.

use crate::error::ConsoleError;

use common::ErrorLocation;
use models::ResultTable;
use rpc_core::client::PsArgs;
use rpc_core::config::RpcConfig;
use rpc_core::session::{LastResult, Session};

use std::io::Write;
use std::panic::Location;

use log::{debug, info};
use serde_json::Value;

const DEFAULT_START_ARGS: &str = "rpc";

const HELP: &str = "\
commands:
  start [args]        start `dbt <args>`, default `rpc` (add --existing to attach)
  stop                stop the managed server
  status              server status
  ps                  active tasks
  kill <task_id>      kill a task
  cli <dbt args>      run a dbt command line and wait for it
  run_sql <sql>       run SQL, print rows
  compile_sql <sql>   compile SQL, print the compiled text
  reload              reload the project (SIGHUP) and wait for ready
  last                print the last SQL result again
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Server arguments, already split: `["rpc", "--port", "8581"]`.
    Start(Vec<String>),
    Stop,
    Status,
    Ps,
    Kill(String),
    Cli(String),
    RunSql(String),
    CompileSql(String),
    Reload,
    Last,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
#[track_caller]
pub fn parse_command(line: &str) -> Result<Option<Command>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let required = |name: &str| -> Result<String, ConsoleError> {
        if rest.is_empty() {
            Err(ConsoleError::Command {
                message: format!("'{name}' needs an argument"),
                location: ErrorLocation::from(Location::caller()),
            })
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word {
        "start" if rest.is_empty() => Command::Start(vec![DEFAULT_START_ARGS.to_string()]),
        "start" => Command::Start(Session::split_line(rest)?),
        "stop" => Command::Stop,
        "status" => Command::Status,
        "ps" => Command::Ps,
        "kill" => Command::Kill(required(word)?),
        "cli" => Command::Cli(required(word)?),
        "run_sql" => Command::RunSql(required(word)?),
        "compile_sql" => Command::CompileSql(required(word)?),
        "reload" => Command::Reload,
        "last" => Command::Last,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(ConsoleError::Command {
                message: format!("Unknown command '{other}' (try 'help')"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    Ok(Some(command))
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Header line plus one line per row, cells separated by tabs.
pub fn render_table(table: &ResultTable) -> String {
    std::iter::once(table.column_names.join("\t"))
        .chain(
            table
                .rows
                .iter()
                .map(|row| row.iter().map(cell_text).collect::<Vec<_>>().join("\t")),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

#[track_caller]
fn emit<W: Write>(out: &mut W, text: &str) -> Result<(), ConsoleError> {
    writeln!(out, "{text}").map_err(|e| ConsoleError::Console {
        message: format!("Failed to write output: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub struct Console {
    session: Session,
}

impl Console {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            session: Session::new(config),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one command, writing its result to `out`.
    pub async fn execute<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> Result<Flow, ConsoleError> {
        debug!("Executing {command:?}");

        match command {
            Command::Start(args) => {
                self.session.start(&args).await?;
                let port = self.session.supervisor()?.port();
                emit(out, &format!("server ready on port {port}"))?;
            }
            Command::Stop => {
                self.session.stop().await;
                emit(out, "stopped")?;
            }
            Command::Status => {
                let result = self.session.client()?.status().await?.result()?;
                emit(out, &pretty(&result))?;
            }
            Command::Ps => {
                let exchange = self.session.client()?.ps(PsArgs::default()).await?;
                let result = exchange.result()?;
                emit(out, &pretty(&result))?;
            }
            Command::Kill(task_id) => {
                let result = self.session.client()?.kill(&task_id).await?.result()?;
                emit(out, &pretty(&result))?;
            }
            Command::Cli(cli) => {
                let client = self.session.client()?;
                let exchange = client.cli_args(&cli).await?;
                let result = client.async_wait_for_result(&exchange, None).await?;
                emit(out, &pretty(&result))?;
            }
            Command::RunSql(sql) => {
                let table = self.session.run_sql(&sql).await?;
                emit(out, &render_table(&table))?;
            }
            Command::CompileSql(sql) => {
                let compiled = self.session.compile_sql(&sql).await?;
                emit(out, &compiled)?;
            }
            Command::Reload => {
                if self.session.reload().await? {
                    emit(out, "reloaded")?;
                } else {
                    emit(out, "reload sent, server not ready yet")?;
                }
            }
            Command::Last => match self.session.last_result() {
                Some(LastResult::Table(table)) => emit(out, &render_table(table))?,
                Some(LastResult::Sql(sql)) => emit(out, sql)?,
                None => emit(out, "no result yet")?,
            },
            Command::Help => emit(out, HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// Stop the managed server, if any.
    pub async fn shutdown(&mut self) {
        if self.session.is_running() {
            info!("Shutting down managed RPC server");
        }
        self.session.stop().await;
    }
}
