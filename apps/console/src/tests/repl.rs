// Unit tests for command parsing, rendering and offline command execution.

use crate::error::ConsoleError;
use crate::repl::{Command, Console, Flow, parse_command, render_table};

use models::ResultTable;
use rpc_core::config::RpcConfig;
use rpc_core::error::session::SessionError;

use serde_json::json;

/// **VALUE**: Verifies that command words and their arguments are split correctly.
///
/// **WHY THIS MATTERS**: SQL contains spaces and quotes; only the first word is the command.
///
/// **BUG THIS CATCHES**: Would catch the SQL being truncated at the first space.
#[test]
fn given_lines_when_parsed_then_commands_with_full_arguments() {
    assert_eq!(
        parse_command("run_sql select 'a b' as x").unwrap(),
        Some(Command::RunSql("select 'a b' as x".to_string()))
    );
    assert_eq!(
        parse_command("  start rpc --port 8581  ").unwrap(),
        Some(Command::Start(args(&["rpc", "--port", "8581"])))
    );
    assert_eq!(
        parse_command("start").unwrap(),
        Some(Command::Start(args(&["rpc"])))
    );
    assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
    assert_eq!(parse_command("   ").unwrap(), None);
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// **VALUE**: Verifies that `start` arguments keep quoted values containing spaces intact.
///
/// **WHY THIS MATTERS**: Profile and project directories often live under paths with
/// spaces; splitting them apart hands dbt a bogus path.
///
/// **BUG THIS CATCHES**: Would catch start arguments being joined or split on whitespace.
#[test]
fn given_quoted_path_when_start_parsed_then_path_is_one_argument() {
    // WHEN
    let command = parse_command("start rpc --profiles-dir '/home/me/dbt profiles' --port 8581")
        .unwrap();

    // THEN
    assert_eq!(
        command,
        Some(Command::Start(args(&[
            "rpc",
            "--profiles-dir",
            "/home/me/dbt profiles",
            "--port",
            "8581"
        ])))
    );

    // AND: unbalanced quotes are a config error, not a truncated argument list
    assert!(matches!(
        parse_command("start rpc --profiles-dir '/home/me"),
        Err(ConsoleError::Config(_))
    ));
}

/// **VALUE**: Verifies that unknown words and missing arguments are command errors.
#[test]
fn given_bad_lines_when_parsed_then_command_error() {
    for line in ["frobnicate", "run_sql", "kill   ", "compile_sql"] {
        assert!(
            matches!(parse_command(line), Err(ConsoleError::Command { .. })),
            "'{line}' should be rejected"
        );
    }
}

/// **VALUE**: Verifies tab-separated rendering with nulls as empty cells.
///
/// **BUG THIS CATCHES**: Would catch strings printed with JSON quotes.
#[test]
fn given_table_when_rendered_then_tab_separated_lines() {
    // GIVEN
    let table = ResultTable {
        column_names: vec!["id".to_string(), "name".to_string()],
        rows: vec![vec![json!(1), json!("alpha")], vec![json!(2), json!(null)]],
    };

    // WHEN
    let rendered = render_table(&table);

    // THEN
    assert_eq!(rendered, "id\tname\n1\talpha\n2\t");
}

/// **VALUE**: Verifies offline commands: help prints, quit ends the loop, SQL without a
/// server is a session error, and `last` reports nothing yet.
#[tokio::test]
async fn given_console_without_server_when_commands_executed_then_offline_behaviour() {
    // GIVEN
    let mut console = Console::new(RpcConfig::default());
    let mut out = Vec::new();

    // WHEN / THEN
    assert_eq!(
        console.execute(Command::Help, &mut out).await.unwrap(),
        Flow::Continue
    );
    assert_eq!(
        console.execute(Command::Last, &mut out).await.unwrap(),
        Flow::Continue
    );
    assert!(matches!(
        console
            .execute(Command::RunSql("select 1".to_string()), &mut out)
            .await,
        Err(ConsoleError::Session(SessionError::NoServer { .. }))
    ));
    assert!(matches!(
        console.execute(Command::Status, &mut out).await,
        Err(ConsoleError::Session(SessionError::NoServer { .. }))
    ));
    assert_eq!(
        console.execute(Command::Quit, &mut out).await.unwrap(),
        Flow::Quit
    );

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("run_sql <sql>"));
    assert!(printed.contains("no result yet"));
    assert!(!console.session().is_running());
}
