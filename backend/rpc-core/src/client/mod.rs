//! Typed JSON-RPC client for the dbt RPC server.
//!
//! Every operation builds one request envelope from its method name and
//! params, sends it, and returns the raw exchange. Interpreting the answer
//! (result, error, or async token) is left to the caller through
//! [`RpcExchange`], since tests and callers often *expect* failures.

pub mod methods;
pub mod params;
pub mod poll;

pub use params::{
    FreshnessArgs, GcArgs, PollArgs, PsArgs, RunOperationArgs, SeedArgs, SelectionArgs, Selector,
    SnapshotArgs, SqlArgs, TestArgs,
};
pub use poll::PollSettings;

use crate::classifier;
use crate::client::params::to_params;
use crate::error::client::ClientError;
use crate::error::response::ResponseError;
use crate::transport::RpcTransport;

use models::{RpcRequest, RpcResponse};

use log::debug;
use serde_json::{Map, Value};

/// One request/response pair. The id is what the response must echo.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcExchange {
    pub request_id: u64,
    pub method: String,
    pub response: Value,
}

impl RpcExchange {
    pub fn result(&self) -> Result<Value, ResponseError> {
        classifier::as_result(&self.response, Some(self.request_id))
    }

    pub fn async_token(&self) -> Result<String, ResponseError> {
        classifier::as_async_token(&self.response, Some(self.request_id))
    }

    pub fn error(&self) -> Result<Value, ResponseError> {
        classifier::as_error(&self.response, Some(self.request_id))
    }

    pub fn classify(&self) -> Result<RpcResponse, ResponseError> {
        classifier::classify(&self.response, Some(self.request_id))
    }
}

/// Client for one server conversation.
///
/// Operations take `&mut self`: request ids are allocated sequentially and a
/// conversation is driven by a single caller at a time.
#[derive(Debug, Clone)]
pub struct RpcClient {
    transport: RpcTransport,
    next_id: u64,
    poll: PollSettings,
}

impl RpcClient {
    pub fn new(transport: RpcTransport) -> Self {
        Self {
            transport,
            next_id: 1,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn poll_settings(&self) -> &PollSettings {
        &self.poll
    }

    pub fn transport(&self) -> &RpcTransport {
        &self.transport
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Send `method` with `params`.
    ///
    /// Known methods get their defaults applied and required params checked;
    /// unknown methods are sent as given.
    pub async fn request(
        &mut self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<RpcExchange, ClientError> {
        let params = match methods::lookup(method) {
            Some(spec) => spec.prepare(params)?,
            None => {
                debug!("'{method}' is not in the method table, sending params unchecked");
                params
            }
        };

        let request = RpcRequest::new(method, params, self.allocate_id());
        let response = self.transport.call(&request).await?;

        Ok(RpcExchange {
            request_id: request.id(),
            method: method.to_string(),
            response,
        })
    }

    /// Call `method` and drive it to completion, polling if it is asynchronous.
    pub async fn execute(
        &mut self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let exchange = self.request(method, params).await?;

        match methods::lookup(method) {
            Some(spec) if spec.asynchronous => self.async_wait_for_result(&exchange, None).await,
            _ => Ok(exchange.result()?),
        }
    }

    pub async fn status(&mut self) -> Result<RpcExchange, ClientError> {
        self.request(methods::STATUS, Map::new()).await
    }

    /// Task list. [`PsArgs::default`] asks for active tasks only.
    pub async fn ps(&mut self, args: PsArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::PS, to_params(&args)?).await
    }

    pub async fn kill(&mut self, task_id: &str) -> Result<RpcExchange, ClientError> {
        let mut params = Map::new();
        params.insert("task_id".to_string(), Value::String(task_id.to_string()));
        self.request(methods::KILL, params).await
    }

    pub async fn poll(&mut self, args: PollArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::POLL, to_params(&args)?).await
    }

    pub async fn gc(&mut self, args: GcArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::GC, to_params(&args)?).await
    }

    /// Run an arbitrary dbt command line through the server.
    pub async fn cli_args(&mut self, cli: &str) -> Result<RpcExchange, ClientError> {
        let mut params = Map::new();
        params.insert("cli".to_string(), Value::String(cli.to_string()));
        self.request(methods::CLI_ARGS, params).await
    }

    pub async fn deps(&mut self) -> Result<RpcExchange, ClientError> {
        self.request(methods::DEPS, Map::new()).await
    }

    pub async fn build(&mut self, args: SelectionArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::BUILD, to_params(&args)?).await
    }

    pub async fn compile(&mut self, args: SelectionArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::COMPILE, to_params(&args)?).await
    }

    pub async fn run(&mut self, args: SelectionArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::RUN, to_params(&args)?).await
    }

    pub async fn run_operation(
        &mut self,
        args: RunOperationArgs,
    ) -> Result<RpcExchange, ClientError> {
        self.request(methods::RUN_OPERATION, to_params(&args)?).await
    }

    pub async fn seed(&mut self, args: SeedArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::SEED, to_params(&args)?).await
    }

    pub async fn snapshot(&mut self, args: SnapshotArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::SNAPSHOT, to_params(&args)?).await
    }

    pub async fn snapshot_freshness(
        &mut self,
        args: FreshnessArgs,
    ) -> Result<RpcExchange, ClientError> {
        self.request(methods::SNAPSHOT_FRESHNESS, to_params(&args)?)
            .await
    }

    pub async fn test(&mut self, args: TestArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::TEST, to_params(&args)?).await
    }

    pub async fn docs_generate(&mut self, compile: Option<bool>) -> Result<RpcExchange, ClientError> {
        let mut params = Map::new();
        if let Some(compile) = compile {
            params.insert("compile".to_string(), Value::Bool(compile));
        }
        self.request(methods::DOCS_GENERATE, params).await
    }

    /// Compile raw SQL without executing it. The text is sent base64-encoded.
    pub async fn compile_sql(&mut self, args: SqlArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::COMPILE_SQL, to_params(&args)?).await
    }

    /// Compile and execute raw SQL. The text is sent base64-encoded.
    pub async fn run_sql(&mut self, args: SqlArgs) -> Result<RpcExchange, ClientError> {
        self.request(methods::RUN_SQL, to_params(&args)?).await
    }

    pub async fn get_manifest(&mut self) -> Result<RpcExchange, ClientError> {
        self.request(methods::GET_MANIFEST, Map::new()).await
    }
}
