//! Poll-until-terminal-state protocol for asynchronous tasks.
//!
//! The server has no push notifications, so a task token is polled at a
//! fixed cadence until its state equals the target state, the server reports
//! an error, or the timeout elapses. There is deliberately no backoff growth.

use crate::classifier;
use crate::client::{RpcClient, RpcExchange};
use crate::client::params::PollArgs;
use crate::config::PollConfig;
use crate::error::client::ClientError;
use crate::error::response::ResponseError;

use common::ErrorLocation;
use models::{RpcResponse, TaskState};

use std::panic::Location;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use log::{debug, trace};
use serde_json::Value;
use tokio::time::{Instant, sleep as TokioSleep};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TARGET_STATE: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub target_state: String,
}

impl PollSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_target_state(mut self, state: impl Into<String>) -> Self {
        self.target_state = state.into();
        self
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
            target_state: DEFAULT_TARGET_STATE.to_string(),
        }
    }
}

impl From<&PollConfig> for PollSettings {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            timeout: config.timeout(),
            target_state: config.target_state.clone(),
        }
    }
}

impl RpcClient {
    /// Poll `token` until it reaches `settings.target_state` or the server reports an error.
    ///
    /// # Returns
    ///
    /// * `Ok(RpcResponse::Result)` - the task reached the target state
    /// * `Ok(RpcResponse::Error)` - the server reported an error for the task
    ///
    /// # Errors
    ///
    /// * [`ClientError::PollTimeout`] - target state not seen within `settings.timeout`
    /// * [`ClientError::Transport`] / [`ClientError::Response`] - a poll call itself failed
    pub async fn async_wait(
        &mut self,
        token: &str,
        settings: &PollSettings,
    ) -> Result<RpcResponse, ClientError> {
        let started = Instant::now();
        let mut cadence = Constant::new(settings.interval);
        let mut last_state: Option<TaskState> = None;
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let exchange = self.poll(PollArgs::new(token)).await?;
            let response = exchange.classify()?;

            let result = match &response {
                RpcResponse::Error { .. } => {
                    debug!("Task {token} failed after {polls} polls");
                    return Ok(response);
                }
                RpcResponse::Result { result, .. } | RpcResponse::AsyncResult { result, .. } => {
                    result
                }
            };

            let state = result
                .get("state")
                .and_then(Value::as_str)
                .map(TaskState::from)
                .ok_or_else(|| ResponseError::ProtocolMismatch {
                    message: format!("Poll result for {token} has no state"),
                    response: exchange.response.clone(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            if state.matches(&settings.target_state) {
                debug!(
                    "Task {token} reached '{state}' after {polls} polls in {:?}",
                    started.elapsed()
                );
                return Ok(response);
            }

            trace!("Task {token} is '{state}' (poll {polls})");
            last_state = Some(state);

            let elapsed = started.elapsed();
            if elapsed > settings.timeout {
                return Err(ClientError::PollTimeout {
                    message: format!(
                        "Task {token} never reached '{}' within {:?}",
                        settings.target_state, settings.timeout
                    ),
                    last_state,
                    elapsed,
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            if let Some(delay) = cadence.next_backoff() {
                TokioSleep(delay).await;
            }
        }
    }

    /// Wait for an async call to finish and return its result payload.
    ///
    /// `target_state` overrides the client's configured target.
    pub async fn async_wait_for_result(
        &mut self,
        exchange: &RpcExchange,
        target_state: Option<&str>,
    ) -> Result<Value, ClientError> {
        let token = exchange.async_token()?;
        let settings = self.settings_for(target_state);
        let response = self.async_wait(&token, &settings).await?;
        Ok(classifier::into_result(response)?)
    }

    /// Wait for an async call that is expected to fail and return its error payload.
    pub async fn async_wait_for_error(
        &mut self,
        exchange: &RpcExchange,
        target_state: Option<&str>,
    ) -> Result<Value, ClientError> {
        let token = exchange.async_token()?;
        let settings = self.settings_for(target_state);
        let response = self.async_wait(&token, &settings).await?;
        Ok(classifier::into_error(response)?)
    }

    /// Poll the server-level `status` until it reports `expected`.
    ///
    /// Sleeps one interval before each check, e.g. to let a reload triggered by
    /// a hang-up signal begin.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if `expected` was not seen within `max_attempts` checks.
    pub async fn wait_for_status(
        &mut self,
        expected: &str,
        max_attempts: u32,
    ) -> Result<bool, ClientError> {
        let mut cadence = Constant::new(self.poll_settings().interval);

        for attempt in 1..=max_attempts {
            if let Some(delay) = cadence.next_backoff() {
                TokioSleep(delay).await;
            }

            let result = self.status().await?.result()?;
            let state = result.get("state").and_then(Value::as_str).unwrap_or_default();

            if state == expected {
                debug!("Server reached '{expected}' after {attempt} checks");
                return Ok(true);
            }

            trace!("Server is '{state}', waiting for '{expected}' (check {attempt})");
        }

        debug!("Server never reached '{expected}' in {max_attempts} checks");
        Ok(false)
    }

    fn settings_for(&self, target_state: Option<&str>) -> PollSettings {
        let settings = self.poll_settings().clone();
        match target_state {
            Some(state) => settings.with_target_state(state),
            None => settings,
        }
    }
}
