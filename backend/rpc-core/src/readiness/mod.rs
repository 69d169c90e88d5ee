//! Bounded readiness probing of an RPC server.
//!
//! The server prints nothing reliable when it is ready, so readiness is
//! inferred: the port must accept connections and a `status` call must
//! report one of the accepted ready states.

use crate::classifier;
use crate::config::RpcConfig;
use crate::error::supervisor::SupervisorError;
use crate::transport::RpcTransport;

use models::RpcRequest;

use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use log::{debug, info, trace};
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep as TokioSleep, timeout as TokioTimeout};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const STATUS_METHOD: &str = "status";
const STATUS_REQUEST_ID: u64 = 1;

/// Attempt a raw TCP connection. Refusal, unresolvable hosts and timeouts are all `false`.
pub async fn can_connect(host: &str, port: u16) -> bool {
    match TokioTimeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            trace!("Connect to {host}:{port} failed: {e}");
            false
        }
        Err(_) => {
            trace!("Connect to {host}:{port} timed out after {CONNECT_TIMEOUT:?}");
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    transport: RpcTransport,
    host: String,
    port: u16,
    attempts: u32,
    interval: Duration,
    ready_states: Vec<String>,
}

impl ReadinessProbe {
    pub fn new(transport: RpcTransport, host: &str, port: u16, config: &RpcConfig) -> Self {
        Self {
            transport,
            host: host.to_string(),
            port,
            attempts: config.readiness.attempts,
            interval: config.readiness.interval(),
            ready_states: config.ready_states.clone(),
        }
    }

    pub async fn is_reachable(&self) -> bool {
        can_connect(&self.host, self.port).await
    }

    /// Issue one `status` call and return the raw response envelope.
    pub async fn status(&self) -> Result<Value, SupervisorError> {
        let request = RpcRequest::new(STATUS_METHOD, Map::new(), STATUS_REQUEST_ID);
        Ok(self.transport.call(&request).await?)
    }

    /// Whether a raw `status` response reports an accepted ready state.
    pub fn is_ready_response(&self, response: &Value) -> bool {
        classifier::as_result(response, Some(STATUS_REQUEST_ID))
            .ok()
            .and_then(|result| {
                result
                    .get("state")
                    .and_then(Value::as_str)
                    .map(|state| self.ready_states.iter().any(|ready| ready == state))
            })
            .unwrap_or(false)
    }

    pub async fn status_ok(&self) -> bool {
        match self.status().await {
            Ok(response) => self.is_ready_response(&response),
            Err(e) => {
                debug!("Status check failed: {e}");
                false
            }
        }
    }

    /// Reachable and reporting a ready state.
    pub async fn is_up(&self) -> bool {
        self.is_reachable().await && self.status_ok().await
    }

    /// Probe up to `attempts` times at a fixed interval.
    ///
    /// # Returns
    ///
    /// * `true` - the server came up within the attempt budget
    /// * `false` - every attempt failed
    pub async fn wait_until_up(&self) -> bool {
        let mut cadence = Constant::new(self.interval);

        debug!(
            "Waiting for RPC server on {}:{} ({} attempts, {:?} apart)",
            self.host, self.port, self.attempts, self.interval
        );

        for attempt in 1..=self.attempts {
            if self.is_up().await {
                info!("RPC server is up on {}:{} (attempt {attempt})", self.host, self.port);
                return true;
            }

            if attempt < self.attempts
                && let Some(delay) = cadence.next_backoff()
            {
                trace!("RPC server not ready (attempt {attempt}), retrying after {delay:?}");
                TokioSleep(delay).await;
            }
        }

        debug!(
            "RPC server on {}:{} not up after {} attempts",
            self.host, self.port, self.attempts
        );
        false
    }
}
