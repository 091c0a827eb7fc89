use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use tracing::warn;

use crate::error::JsonRpcError;

/// What a handler hands back: an optional raw result, or an error object.
///
/// `Ok(None)` produces a response envelope with neither `result` nor `error`.
pub type HandlerResult = Result<Option<Box<RawValue>>, JsonRpcError>;

/// Per-call context supplied by the transport.
///
/// The engine only passes it through; cancellation and deadlines are the
/// handler's own concern.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Peer address, when the transport knows it
    pub remote_addr: Option<SocketAddr>,
    /// Endpoint the request arrived on (e.g. `host/path`)
    pub endpoint: Option<String>,
    /// Transport metadata such as HTTP headers
    pub metadata: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Trait for handling a JSON-RPC method call
#[async_trait]
pub trait JsonRpcHandler: Send + Sync {
    /// Handle one call. `params` is the raw JSON span from the request, or
    /// `None` when the request had no (or `null`) params.
    async fn handle(&self, ctx: RequestContext, params: Option<Box<RawValue>>) -> HandlerResult;
}

/// A closure- or fn-based handler
pub struct FunctionHandler<F> {
    handler_fn: F,
}

impl<F, Fut> FunctionHandler<F>
where
    F: Fn(RequestContext, Option<Box<RawValue>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(handler_fn: F) -> Self {
        Self { handler_fn }
    }
}

#[async_trait]
impl<F, Fut> JsonRpcHandler for FunctionHandler<F>
where
    F: Fn(RequestContext, Option<Box<RawValue>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: RequestContext, params: Option<Box<RawValue>>) -> HandlerResult {
        (self.handler_fn)(ctx, params).await
    }
}

/// Serialize a handler's return value into a success result.
/// A value that cannot be serialized becomes an internal error.
pub fn to_result<T: Serialize + ?Sized>(value: &T) -> HandlerResult {
    serde_json::value::to_raw_value(value).map(Some).map_err(|e| {
        warn!(error = %e, "Failed to serialize handler result");
        JsonRpcError::internal_error()
    })
}

/// Decode raw params into `T`, answering with Invalid params on mismatch.
/// Missing params decode as JSON `null`.
pub fn parse_params<T: DeserializeOwned>(params: Option<&RawValue>) -> Result<T, JsonRpcError> {
    let text = params.map_or("null", RawValue::get);
    serde_json::from_str(text).map_err(|e| {
        serde_json::value::to_raw_value(&e.to_string()).map_or_else(
            |_| JsonRpcError::invalid_params(),
            |data| JsonRpcError::invalid_params().with_data(data),
        )
    })
}
