//! Single-shot HTTP POST transport for JSON-RPC envelopes.

use crate::RPC_ENDPOINT_PATH;
use crate::error::transport::TransportError;

use common::{ErrorLocation, HttpStatusCode};
use models::RpcRequest;

use std::panic::Location;
use std::time::Duration;

use log::{debug, trace};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Raw outcome of one POST: status plus undecoded body.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: HttpStatusCode,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RpcTransport {
    endpoint: Url,
    client: Client,
}

impl RpcTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { endpoint, client })
    }

    /// Transport for `http://{host}:{port}/jsonrpc`.
    pub fn for_server(host: &str, port: u16, timeout: Duration) -> Result<Self, TransportError> {
        Self::new(
            &format!("http://{host}:{port}/{RPC_ENDPOINT_PATH}"),
            timeout,
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST `body` once. Connection failures surface as [`TransportError::Http`].
    pub async fn post(&self, body: &Value) -> Result<HttpReply, TransportError> {
        let payload = serde_json::to_vec(body)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;

        let status = HttpStatusCode::from(response.status().as_u16());
        let body = response.text().await?;
        trace!("POST {} -> {status}: {body}", self.endpoint);

        Ok(HttpReply { status, body })
    }

    /// Send a request envelope and decode the response envelope.
    ///
    /// Non-2xx replies are errors; the envelope itself is not validated here.
    pub async fn call(&self, request: &RpcRequest) -> Result<Value, TransportError> {
        debug!("RPC {} (id {})", request.method(), request.id());

        let reply = self.post(&serde_json::to_value(request)?).await?;

        if !reply.status.is_success() {
            return Err(TransportError::Status {
                status: reply.status,
                body: reply.body,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(serde_json::from_str(&reply.body)?)
    }
}
