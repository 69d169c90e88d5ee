//! Validation and classification of JSON-RPC response envelopes.
//!
//! A response is either a result, an error, or a result whose payload is a
//! `request_token` for a task still running on the server.

use crate::error::response::ResponseError;

use common::ErrorLocation;
use models::{JSONRPC_VERSION, RpcErrorPayload, RpcResponse};

use std::panic::Location;

use serde_json::{Map, Value};

const JSONRPC_KEY: &str = "jsonrpc";
const ID_KEY: &str = "id";
const RESULT_KEY: &str = "result";
const ERROR_KEY: &str = "error";
const REQUEST_TOKEN_KEY: &str = "request_token";

#[track_caller]
fn mismatch(message: impl Into<String>, response: &Value) -> ResponseError {
    ResponseError::ProtocolMismatch {
        message: message.into(),
        response: response.clone(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn rpc_error(payload: &Value) -> ResponseError {
    let message = match RpcErrorPayload::from_value(payload) {
        Some(typed) => format!("server error {}: {}", typed.code, typed.message),
        None => format!("server error: {payload}"),
    };

    ResponseError::Rpc {
        message,
        payload: payload.clone(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Protocol tag and id echo checks shared by every classification.
#[track_caller]
fn check_envelope(
    response: &Value,
    expected_id: Option<u64>,
) -> Result<&Map<String, Value>, ResponseError> {
    let envelope = response
        .as_object()
        .ok_or_else(|| mismatch("Response is not a JSON object", response))?;

    match envelope.get(JSONRPC_KEY).and_then(Value::as_str) {
        Some(JSONRPC_VERSION) => {}
        other => {
            return Err(mismatch(
                format!("Expected jsonrpc \"{JSONRPC_VERSION}\", got {other:?}"),
                response,
            ));
        }
    }

    if let Some(expected) = expected_id {
        let actual = envelope.get(ID_KEY).and_then(Value::as_u64);
        if actual != Some(expected) {
            return Err(mismatch(
                format!("Expected response id {expected}, got {actual:?}"),
                response,
            ));
        }
    }

    Ok(envelope)
}

/// Returns the `result` member.
///
/// # Errors
///
/// * [`ResponseError::ProtocolMismatch`] - wrong protocol tag or id echo
/// * [`ResponseError::Rpc`] - the response carries `error` or lacks `result`
#[track_caller]
pub fn as_result(response: &Value, expected_id: Option<u64>) -> Result<Value, ResponseError> {
    let envelope = check_envelope(response, expected_id)?;

    if let Some(error) = envelope.get(ERROR_KEY) {
        return Err(rpc_error(error));
    }

    envelope
        .get(RESULT_KEY)
        .cloned()
        .ok_or_else(|| rpc_error(response))
}

/// Returns the `request_token` of an asynchronous result.
#[track_caller]
pub fn as_async_token(response: &Value, expected_id: Option<u64>) -> Result<String, ResponseError> {
    let result = as_result(response, expected_id)?;

    result
        .get(REQUEST_TOKEN_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| mismatch("Result has no request_token", response))
}

/// Returns the `error` member of a response expected to have failed.
#[track_caller]
pub fn as_error(response: &Value, expected_id: Option<u64>) -> Result<Value, ResponseError> {
    let envelope = check_envelope(response, expected_id)?;

    if envelope.contains_key(RESULT_KEY) {
        return Err(mismatch("Expected an error response, got a result", response));
    }

    envelope
        .get(ERROR_KEY)
        .cloned()
        .ok_or_else(|| mismatch("Response has neither result nor error", response))
}

/// Decode a response into one of the three envelope shapes.
#[track_caller]
pub fn classify(response: &Value, expected_id: Option<u64>) -> Result<RpcResponse, ResponseError> {
    let envelope = check_envelope(response, expected_id)?;
    let id = envelope.get(ID_KEY).and_then(Value::as_u64);

    match (envelope.get(RESULT_KEY), envelope.get(ERROR_KEY)) {
        (Some(_), Some(_)) => Err(mismatch("Response has both result and error", response)),
        (None, None) => Err(mismatch("Response has neither result nor error", response)),
        (None, Some(error)) => Ok(RpcResponse::Error {
            id,
            error: error.clone(),
        }),
        (Some(result), None) => match result.get(REQUEST_TOKEN_KEY).and_then(Value::as_str) {
            Some(token) => Ok(RpcResponse::AsyncResult {
                id,
                request_token: token.to_string(),
                result: result.clone(),
            }),
            None => Ok(RpcResponse::Result {
                id,
                result: result.clone(),
            }),
        },
    }
}

/// Unwrap a classified response into its result payload.
#[track_caller]
pub fn into_result(response: RpcResponse) -> Result<Value, ResponseError> {
    match response {
        RpcResponse::Result { result, .. } | RpcResponse::AsyncResult { result, .. } => Ok(result),
        RpcResponse::Error { error, .. } => Err(rpc_error(&error)),
    }
}

/// Unwrap a classified response into its error payload.
#[track_caller]
pub fn into_error(response: RpcResponse) -> Result<Value, ResponseError> {
    match response {
        RpcResponse::Error { error, .. } => Ok(error),
        RpcResponse::Result { result, .. } | RpcResponse::AsyncResult { result, .. } => Err(
            mismatch("Expected an error response, got a result", &result),
        ),
    }
}
