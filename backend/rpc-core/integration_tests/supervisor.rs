use crate::helpers::{mount_status, port_of, strings, test_config, unused_port};

use rpc_core::config::RpcConfig;
use rpc_core::error::supervisor::SupervisorError;
use rpc_core::supervisor::{ProcessSignal, ProcessSupervisor};

use wiremock::MockServer;

/// Config that launches `sh` in place of the dbt binary.
fn shell_config() -> RpcConfig {
    RpcConfig {
        binary: "sh".to_string(),
        ..test_config()
    }
}

/// **VALUE**: Verifies attach mode: start succeeds against a running server, and the
/// supervisor never claims, signals or stops it.
///
/// **WHY THIS MATTERS**: `--existing` points at a server somebody else owns; killing it
/// would take down their session.
///
/// **BUG THIS CATCHES**: Would catch a spawn in attach mode or a signal sent to a
/// process we do not own.
#[tokio::test]
async fn given_existing_server_when_started_then_attached_and_never_signalled() {
    // GIVEN
    let server = MockServer::start().await;
    mount_status(&server, "ready").await;
    let port = port_of(&server).to_string();
    let mut supervisor = ProcessSupervisor::configure(
        &strings(&["rpc", "--existing", "--port", &port]),
        &test_config(),
    )
    .unwrap();

    // WHEN
    supervisor.start().await.unwrap();

    // THEN
    assert!(supervisor.is_existing());
    assert!(!supervisor.is_spawned());
    assert!(supervisor.is_up().await);
    assert!(matches!(
        supervisor.send_signal(ProcessSignal::Hangup),
        Err(SupervisorError::NoProcess { .. })
    ));

    // AND: stop is a no-op, repeatable, and the server stays reachable
    supervisor.stop().await;
    supervisor.stop().await;
    assert!(supervisor.is_reachable().await);
}

/// **VALUE**: Verifies the spawn lifecycle: start, signal, stop, stop again.
///
/// **WHY THIS MATTERS**: Stop must reap the child and be safe to call repeatedly from
/// cleanup paths.
///
/// **BUG THIS CATCHES**: Would catch a second stop panicking or a child left running.
#[cfg(unix)]
#[tokio::test]
async fn given_spawned_server_when_started_and_stopped_then_process_reaped() {
    // GIVEN: A long-lived child, with the mock playing the server on the forwarded port
    let server = MockServer::start().await;
    mount_status(&server, "ready").await;
    let port = port_of(&server).to_string();
    let mut supervisor = ProcessSupervisor::configure(
        &strings(&["-c", "exec sleep 30", "--port", &port]),
        &shell_config(),
    )
    .unwrap();

    // WHEN
    supervisor.start().await.unwrap();

    // THEN
    assert!(supervisor.is_spawned());
    assert!(supervisor.pid().is_some());
    assert!(supervisor.send_signal(ProcessSignal::Interrupt).is_ok());

    supervisor.stop().await;
    assert!(!supervisor.is_spawned());
    assert_eq!(supervisor.pid(), None);
    supervisor.stop().await;
    assert!(matches!(
        supervisor.send_signal(ProcessSignal::Hangup),
        Err(SupervisorError::NoProcess { .. })
    ));
}

/// **VALUE**: Verifies that starting an already-running supervisor replaces the child:
/// the old process is terminated and reaped, and `pid()` reports the new one.
///
/// **WHY THIS MATTERS**: A restart that forgets the previous child leaves an orphaned
/// server holding the port.
///
/// **BUG THIS CATCHES**: Would catch `start()` overwriting the child handle without
/// stopping the process behind it.
#[cfg(unix)]
#[tokio::test]
async fn given_running_child_when_started_again_then_old_process_gone() {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    // GIVEN: A supervisor that already owns a child
    let server = MockServer::start().await;
    mount_status(&server, "ready").await;
    let port = port_of(&server).to_string();
    let mut supervisor = ProcessSupervisor::configure(
        &strings(&["-c", "exec sleep 30", "--port", &port]),
        &shell_config(),
    )
    .unwrap();
    supervisor.start().await.unwrap();
    let first = supervisor.pid().unwrap();

    // WHEN
    supervisor.start().await.unwrap();

    // THEN: A different child is running and the first one no longer exists
    let second = supervisor.pid().unwrap();
    assert_ne!(first, second);
    assert!(supervisor.is_spawned());

    let first = Pid::from_u32(first);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[first]), true);
    assert!(sys.process(first).is_none(), "PID {first} still running");

    supervisor.stop().await;
}

/// **VALUE**: Verifies that a server that never comes up yields `ServerUnavailable`
/// carrying what the process printed, and that the child is stopped.
///
/// **WHY THIS MATTERS**: The printed output is the only explanation of why dbt failed.
///
/// **BUG THIS CATCHES**: Would catch output capture being lost or the child leaking.
#[cfg(unix)]
#[tokio::test]
async fn given_server_never_listens_when_started_then_unavailable_with_output() {
    // GIVEN
    let port = unused_port().to_string();
    let mut supervisor = ProcessSupervisor::configure(
        &strings(&[
            "-c",
            "echo 'Encountered an error: profile not found' >&2; exec sleep 30",
            "--port",
            &port,
        ]),
        &shell_config(),
    )
    .unwrap();

    // WHEN
    let outcome = supervisor.start().await;

    // THEN
    match outcome {
        Err(err @ SupervisorError::ServerUnavailable { .. }) => {
            let output = err.output().unwrap_or_default();
            assert!(output.contains("profile not found"), "output: {output}");
        }
        other => panic!("Expected ServerUnavailable, got {other:?}"),
    }
    assert!(!supervisor.is_spawned());
}

/// **VALUE**: Verifies that a reachable server in a non-ready state yields `InvalidStatus`
/// with the offending response.
#[tokio::test]
async fn given_server_not_ready_when_started_then_invalid_status_with_response() {
    // GIVEN
    let server = MockServer::start().await;
    mount_status(&server, "compiling").await;
    let port = port_of(&server).to_string();
    let mut supervisor = ProcessSupervisor::configure(
        &strings(&["rpc", "--existing", "--port", &port]),
        &test_config(),
    )
    .unwrap();

    // WHEN
    let outcome = supervisor.start().await;

    // THEN
    match outcome {
        Err(SupervisorError::InvalidStatus { response, .. }) => {
            assert_eq!(response["result"]["state"], "compiling");
        }
        other => panic!("Expected InvalidStatus, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a missing binary is a spawn error.
#[tokio::test]
async fn given_missing_binary_when_started_then_spawn_error() {
    // GIVEN
    let config = RpcConfig {
        binary: "/nonexistent/bin/dbt".to_string(),
        ..test_config()
    };
    let mut supervisor =
        ProcessSupervisor::configure(&strings(&["rpc", "--port", "8599"]), &config).unwrap();

    // WHEN
    let outcome = supervisor.start().await;

    // THEN
    assert!(matches!(outcome, Err(SupervisorError::Spawn { .. })));
    assert!(!supervisor.is_spawned());
}
