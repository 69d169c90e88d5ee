// Unit tests for supervisor argument handling, spawn command construction and
// output capture. Lifecycle tests against live processes are in
// integration_tests/supervisor.rs.

use crate::RPC_DEFAULT_URL;
use crate::config::RpcConfig;
use crate::error::config::ConfigError;
use crate::session::{Session, limit_query};
use crate::supervisor::ProcessSupervisor;
use crate::supervisor::args::parse_server_args;
use crate::supervisor::build_spawn_command;
use crate::supervisor::output::{CapturedOutput, capture};

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// **VALUE**: Verifies both `--port` spellings and that the port is still forwarded.
///
/// **WHY THIS MATTERS**: The server must listen on the same port the client probes;
/// stripping `--port` would start it on its default port instead.
///
/// **BUG THIS CATCHES**: Would catch the flag value being consumed but not forwarded.
#[test]
fn given_port_flags_when_parsed_then_port_extracted_and_forwarded() {
    // GIVEN / WHEN
    let spaced = parse_server_args(&args(&["rpc", "--port", "8581"]), 8580).unwrap();
    let joined = parse_server_args(&args(&["rpc", "--port=9000", "--threads", "4"]), 8580).unwrap();
    let absent = parse_server_args(&args(&["rpc"]), 8580).unwrap();

    // THEN
    assert_eq!(spaced.port, 8581);
    assert_eq!(spaced.forwarded, args(&["rpc", "--port", "8581"]));
    assert_eq!(joined.port, 9000);
    assert_eq!(joined.forwarded, args(&["rpc", "--port=9000", "--threads", "4"]));
    assert_eq!(absent.port, 8580);
}

/// **VALUE**: Verifies that `--existing` switches to attach mode and is not forwarded.
///
/// **WHY THIS MATTERS**: `dbt rpc` does not know `--existing` and would refuse to start.
///
/// **BUG THIS CATCHES**: Would catch the supervisor-only flag leaking into the command line.
#[test]
fn given_existing_flag_when_parsed_then_attach_mode_and_flag_stripped() {
    // GIVEN / WHEN
    let parsed = parse_server_args(&args(&["rpc", "--existing", "--port", "8585"]), 8580).unwrap();

    // THEN
    assert!(parsed.existing);
    assert_eq!(parsed.port, 8585);
    assert!(!parsed.forwarded.iter().any(|arg| arg == "--existing"));
}

/// **VALUE**: Verifies that bad port values are reported as configuration errors.
///
/// **WHY THIS MATTERS**: The failure must be raised before any process is spawned.
///
/// **BUG THIS CATCHES**: Would catch a dangling `--port` or an out-of-range value falling
/// back to the default port.
#[test]
fn given_invalid_port_values_when_parsed_then_invalid_port_error() {
    for bad in [
        args(&["rpc", "--port"]),
        args(&["rpc", "--port", "eighty"]),
        args(&["rpc", "--port=70000"]),
    ] {
        // WHEN
        let outcome = parse_server_args(&bad, 8580);

        // THEN
        assert!(
            matches!(outcome, Err(ConfigError::InvalidPort { .. })),
            "{bad:?} should be rejected"
        );
    }
}

/// **VALUE**: Verifies that the spawn command is the configured binary plus forwarded args.
///
/// **BUG THIS CATCHES**: Would catch the binary being hard-coded or args being reordered.
#[test]
fn given_configured_supervisor_when_build_spawn_command_then_binary_and_args_match() {
    // GIVEN
    let config = RpcConfig {
        binary: "/opt/dbt/bin/dbt".to_string(),
        ..RpcConfig::default()
    };
    let supervisor =
        ProcessSupervisor::configure(&args(&["rpc", "--port", "8590"]), &config).unwrap();

    // WHEN
    let cmd = build_spawn_command(supervisor.command());

    // THEN
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), "/opt/dbt/bin/dbt");
    let forwarded: Vec<_> = std_cmd.get_args().collect();
    assert_eq!(forwarded, ["rpc", "--port", "8590"]);
    assert_eq!(supervisor.port(), 8590);
    assert!(!supervisor.is_spawned());
    assert_eq!(supervisor.pid(), None);
}

/// **VALUE**: Verifies that captured output is bounded and keeps the newest lines.
///
/// **WHY THIS MATTERS**: A chatty server left running for hours must not grow memory
/// without bound, and a start failure must report its *last* lines.
///
/// **BUG THIS CATCHES**: Would catch dropping the newest instead of the oldest lines.
#[test]
fn given_many_lines_when_captured_then_oldest_dropped() {
    // GIVEN
    let output = CapturedOutput::default();

    // WHEN
    for n in 0..600 {
        output.push(format!("line {n}"));
    }

    // THEN
    let snapshot = output.snapshot();
    assert!(snapshot.starts_with("line 100\n"));
    assert!(snapshot.ends_with("line 599"));
    output.clear();
    assert!(output.snapshot().is_empty());
}

/// **VALUE**: Verifies the row-limiting wrapper used by `run_sql`.
///
/// **BUG THIS CATCHES**: Would catch the limit or alias being dropped from the query.
#[test]
fn given_sql_when_limit_query_then_wrapped_with_limit() {
    assert_eq!(
        limit_query("select 1 as a", 500),
        "select * from (select 1 as a) dbt_run_sql limit 500"
    );
}

/// **VALUE**: Verifies shell-style splitting of a start line.
///
/// **WHY THIS MATTERS**: Quoted profile paths with spaces must survive as one argument.
///
/// **BUG THIS CATCHES**: Would catch naive whitespace splitting.
#[test]
fn given_start_line_when_split_then_quotes_respected() {
    // GIVEN / WHEN
    let split = Session::split_line("rpc --profiles-dir '/tmp/my profiles' --port 8581").unwrap();

    // THEN
    assert_eq!(
        split,
        args(&["rpc", "--profiles-dir", "/tmp/my profiles", "--port", "8581"])
    );
    assert!(matches!(
        Session::split_line("rpc 'unterminated"),
        Err(ConfigError::ValidationError { .. })
    ));
}

/// **VALUE**: Verifies that a default configuration talks to the documented endpoint.
///
/// **BUG THIS CATCHES**: Would catch the endpoint path or default port drifting apart
/// between the constants and the transport.
#[test]
fn given_default_config_when_configured_then_endpoint_is_default_url() {
    // GIVEN / WHEN
    let supervisor = ProcessSupervisor::configure(&args(&["rpc"]), &RpcConfig::default()).unwrap();

    // THEN
    assert_eq!(supervisor.transport().endpoint().as_str(), RPC_DEFAULT_URL);
    assert!(!supervisor.is_existing());
}

/// **VALUE**: Verifies that output which is not valid UTF-8 is captured lossily and the
/// reader keeps draining until the child exits.
///
/// **WHY THIS MATTERS**: A reader that stops early drops the pipe's read end; the server's
/// next write then dies of SIGPIPE and every later diagnostic line is lost.
///
/// **BUG THIS CATCHES**: Would catch `lines()`-style decoding that ends the reader on the
/// first invalid byte sequence.
#[cfg(unix)]
#[tokio::test]
async fn given_invalid_utf8_output_when_captured_then_child_survives_and_later_lines_kept() {
    use std::process::Stdio;
    use tokio::process::Command as TokioCommand;

    // GIVEN: A child that prints a latin-1 line, then more than a pipe buffer of output
    let script = "echo before; printf '\\377\\376 latin1 bytes\\n'; sleep 0.2; \
        i=0; while [ $i -lt 10000 ]; do echo padding-$i; i=$((i+1)); done; \
        printf '\\377 tail\\n'; echo child-finished-ok";
    let mut child = TokioCommand::new("sh")
        .args(["-c", script])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let output = CapturedOutput::default();
    let reader = capture(child.stdout.take().unwrap(), output.clone(), "stdout");

    // WHEN: The child runs to completion
    let status = child.wait().await.unwrap();
    reader.await.unwrap();

    // THEN: No SIGPIPE, and lines after both invalid sequences were captured
    assert!(status.success(), "child exited with {status}");
    let snapshot = output.snapshot();
    assert!(snapshot.contains("padding-9999"));
    assert!(snapshot.contains("\u{FFFD} tail"));
    assert!(snapshot.ends_with("child-finished-ok"));
}
