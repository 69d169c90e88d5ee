use dbt_rpc_console::error::ConsoleError;
use dbt_rpc_console::logger::initialize as LoggerInitialize;
use dbt_rpc_console::repl::{Command, Console, Flow, parse_command};

use common::ErrorLocation;
use rpc_core::config::RpcConfig;

use std::fs::create_dir_all;
use std::io::{Write, stdout};
use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

const APP_DIR_NAME: &str = "dbt-rpc";
const LOG_DIR_NAME: &str = "logs";
const PROMPT: &str = "dbt-rpc> ";

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(LOG_DIR_NAME)
}

fn report(err: &ConsoleError) {
    error!("{err}");
    eprintln!("error: {err}");
    if let Some(output) = err.server_output().filter(|output| !output.is_empty()) {
        eprintln!("--- server output ---\n{output}");
    }
}

fn prompt() {
    let mut out = stdout();
    // A closed stdout shows up on the next command write.
    let _ = write!(out, "{PROMPT}").and_then(|()| out.flush());
}

async fn run() -> Result<(), ConsoleError> {
    let log_dir = log_dir();
    create_dir_all(&log_dir).map_err(|e| ConsoleError::Console {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    LoggerInitialize(&log_dir)?;
    info!("dbt RPC console starting");
    info!("Log directory: {}", log_dir.display());

    let config = RpcConfig::load_default()?;
    let mut console = Console::new(config);

    // Arguments on the command line start a server right away, e.g. `rpc --port 8581`.
    let startup: Vec<String> = std::env::args().skip(1).collect();
    if !startup.is_empty() {
        let command = Command::Start(startup);
        if let Err(e) = console.execute(command, &mut stdout()).await {
            report(&e);
        }
    }

    let mut lines = BufReader::new(stdin()).lines();
    prompt();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                console.shutdown().await;
                return Err(ConsoleError::Console {
                    message: format!("Failed to read input: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        match parse_command(&line) {
            Ok(Some(command)) => match console.execute(command, &mut stdout()).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => report(&e),
            },
            Ok(None) => {}
            Err(e) => report(&e),
        }

        prompt();
    }

    console.shutdown().await;
    info!("dbt RPC console exiting");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}
