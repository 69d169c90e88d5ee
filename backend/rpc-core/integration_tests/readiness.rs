use crate::helpers::{TEST_HOST, mount_status, port_of, test_config, unused_port};

use rpc_core::readiness::{ReadinessProbe, can_connect};
use rpc_core::transport::RpcTransport;

use std::time::{Duration, Instant};

use wiremock::MockServer;

fn probe_for(port: u16) -> ReadinessProbe {
    let transport = RpcTransport::for_server(TEST_HOST, port, Duration::from_secs(2)).unwrap();
    ReadinessProbe::new(transport, TEST_HOST, port, &test_config())
}

/// **VALUE**: Verifies that a listening server reporting "ready" is up on the first attempt.
///
/// **BUG THIS CATCHES**: Would catch a ready server being reported as down.
#[tokio::test]
async fn given_ready_server_when_wait_until_up_then_true() {
    // GIVEN
    let server = MockServer::start().await;
    mount_status(&server, "ready").await;
    let probe = probe_for(port_of(&server));

    // WHEN
    let up = probe.wait_until_up().await;

    // THEN
    assert!(up);
    assert!(probe.status_ok().await);
}

/// **VALUE**: Verifies that a reachable server in a non-ready state is not "up".
///
/// **WHY THIS MATTERS**: While compiling the project the server accepts connections but
/// cannot serve requests yet.
///
/// **BUG THIS CATCHES**: Would catch readiness being decided by the TCP connect alone.
#[tokio::test]
async fn given_compiling_server_when_probed_then_reachable_but_not_up() {
    // GIVEN
    let server = MockServer::start().await;
    mount_status(&server, "compiling").await;
    let probe = probe_for(port_of(&server));

    // WHEN / THEN
    assert!(probe.is_reachable().await);
    assert!(!probe.status_ok().await);
    assert!(!probe.is_up().await);
}

/// **VALUE**: Verifies the bounded attempt budget and fixed cadence.
///
/// **WHY THIS MATTERS**: 3 attempts 100ms apart must give up after ~200ms, not grow.
///
/// **BUG THIS CATCHES**: Would catch exponential growth or an unbounded loop.
#[tokio::test]
async fn given_nothing_listening_when_wait_until_up_then_false_after_budget() {
    // GIVEN
    let port = unused_port();
    let probe = probe_for(port);

    // WHEN
    let started = Instant::now();
    let up = probe.wait_until_up().await;
    let elapsed = started.elapsed();

    // THEN
    assert!(!up);
    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "elapsed {elapsed:?}");
    assert!(!can_connect(TEST_HOST, port).await);
}
