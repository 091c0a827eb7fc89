//! Server-side dispatch: raw request bytes in, raw response bytes out.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use tracing::{Instrument, debug, error, field, info_span};

use crate::error::JsonRpcError;
use crate::handler::{FunctionHandler, HandlerResult, JsonRpcHandler, RequestContext};

/// Immutable method table: method name to handler.
pub type MethodTable = HashMap<String, Arc<dyn JsonRpcHandler>>;

const INTERNAL_ERROR_RESPONSE: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal JSON-RPC error"}}"#;

/// Inbound request as seen by the server.
///
/// `id` and `params` stay raw so the id is echoed byte-for-byte and params reach
/// the handler untouched. Missing or `null` `jsonrpc`/`method` decode as empty
/// strings and are then rejected as Invalid Request rather than Parse error.
/// A repeated key overwrites the earlier one.
#[derive(Debug, Default)]
struct ServerRequest {
    version: String,
    method: String,
    params: Option<Box<RawValue>>,
    id: Option<Box<RawValue>>,
}

impl<'de> Deserialize<'de> for ServerRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ServerRequestVisitor;

        impl<'de> Visitor<'de> for ServerRequestVisitor {
            type Value = ServerRequest;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON-RPC request object")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut request = ServerRequest::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "jsonrpc" => {
                            let version: Option<String> = map.next_value()?;
                            request.version = version.unwrap_or_default();
                        }
                        "method" => {
                            let method: Option<String> = map.next_value()?;
                            request.method = method.unwrap_or_default();
                        }
                        "params" => request.params = map.next_value()?,
                        "id" => request.id = map.next_value()?,
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(request)
            }
        }

        deserializer.deserialize_map(ServerRequestVisitor)
    }
}

impl ServerRequest {
    fn validate(&self) -> bool {
        self.version == crate::JSONRPC_VERSION && !self.method.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct ServerResponse<'a> {
    jsonrpc: &'static str,
    id: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a JsonRpcError>,
}

/// The JSON-RPC dispatch engine.
///
/// Cheap to clone; clones share the same frozen method table.
#[derive(Clone, Default)]
pub struct JsonRpcServer {
    methods: Arc<MethodTable>,
}

impl JsonRpcServer {
    pub fn new(methods: MethodTable) -> Self {
        Self {
            methods: Arc::new(methods),
        }
    }

    pub fn builder() -> JsonRpcServerBuilder {
        JsonRpcServerBuilder::new()
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Handle one payload: a single request or a batch.
    ///
    /// Never fails; every failure becomes a well-formed error response.
    pub async fn call(&self, ctx: RequestContext, data: &[u8]) -> Vec<u8> {
        let error = match parse_request(data) {
            Ok(request) => return self.dispatch(ctx, request).await,
            Err(error) => error,
        };

        // Only fall back to a batch once the single-request parse has failed.
        match serde_json::from_slice::<Vec<&RawValue>>(data) {
            Ok(elements) => self.batch(ctx, &elements).await,
            Err(_) => {
                debug!(code = error.code, "Rejecting unparseable payload");
                error_response_bytes(&error, None)
            }
        }
    }

    async fn batch(&self, ctx: RequestContext, elements: &[&RawValue]) -> Vec<u8> {
        debug!(size = elements.len(), "Dispatching batch");

        // Each element is its own task so a blocking handler cannot hold up its
        // siblings. join_all yields outputs in input order, whatever order they
        // finish in.
        let tasks = elements.iter().map(|element| {
            let server = self.clone();
            let ctx = ctx.clone();
            let data = element.get().as_bytes().to_vec();
            tokio::spawn(async move { server.call_single(ctx, &data).await }.in_current_span())
        });
        let responses: Vec<Vec<u8>> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    error!(error = %e, "Batch element task failed");
                    error_response_bytes(&JsonRpcError::internal_error(), None)
                })
            })
            .collect();

        let mut out = Vec::with_capacity(responses.iter().map(|r| r.len() + 1).sum::<usize>() + 2);
        out.push(b'[');
        for (i, response) in responses.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.extend_from_slice(response);
        }
        out.push(b']');
        out
    }

    async fn call_single(&self, ctx: RequestContext, data: &[u8]) -> Vec<u8> {
        match parse_request(data) {
            Ok(request) => self.dispatch(ctx, request).await,
            Err(error) => error_response_bytes(&error, None),
        }
    }

    async fn dispatch(&self, ctx: RequestContext, request: ServerRequest) -> Vec<u8> {
        let span = info_span!(
            "rpc.request",
            otel.name = %format!("handle rpc: {}", request.method),
            rpc.method = %request.method,
            rpc.request_id = field::Empty,
        );
        if let Some(id) = request.id.as_deref() {
            span.record("rpc.request_id", id.get());
        }

        let result = self
            .execute(ctx, &request.method, request.params)
            .instrument(span)
            .await;

        let id = request.id.as_deref();
        match result {
            Ok(result) => response_bytes(id, result.as_deref()),
            Err(error) => error_response_bytes(&error, id),
        }
    }

    async fn execute(
        &self,
        ctx: RequestContext,
        method: &str,
        params: Option<Box<RawValue>>,
    ) -> HandlerResult {
        let Some(handler) = self.methods.get(method) else {
            debug!(method, "Method not found");
            return Err(JsonRpcError::method_not_found());
        };

        let invocation = async move { handler.handle(ctx, params).await };
        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(method, panic = %message, "Handler panicked");
                Err(JsonRpcError::internal_error())
            }
        }
    }
}

/// Builder for [`JsonRpcServer`]; the method table is frozen by [`build`](Self::build).
#[derive(Default)]
pub struct JsonRpcServerBuilder {
    methods: MethodTable,
}

impl JsonRpcServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a specific method
    pub fn handler<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: JsonRpcHandler + 'static,
    {
        self.methods.insert(method.into(), Arc::new(handler));
        self
    }

    /// Register an async fn or closure for a specific method
    pub fn method<F, Fut>(self, method: impl Into<String>, handler_fn: F) -> Self
    where
        F: Fn(RequestContext, Option<Box<RawValue>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler(method, FunctionHandler::new(handler_fn))
    }

    pub fn build(self) -> JsonRpcServer {
        JsonRpcServer::new(self.methods)
    }
}

/// Error response for a payload that could not be read at all.
/// Transports use it for non-POST requests and empty bodies.
pub fn parse_error_response() -> Vec<u8> {
    error_response_bytes(&JsonRpcError::parse_error(), None)
}

fn parse_request(data: &[u8]) -> Result<ServerRequest, JsonRpcError> {
    // A JSON array would otherwise decode into the struct positionally.
    if !data.trim_ascii_start().starts_with(b"{") {
        return Err(JsonRpcError::parse_error());
    }
    let request: ServerRequest =
        serde_json::from_slice(data).map_err(|_| JsonRpcError::parse_error())?;
    if !request.validate() {
        return Err(JsonRpcError::invalid_request());
    }
    Ok(request)
}

fn response_bytes(id: Option<&RawValue>, result: Option<&RawValue>) -> Vec<u8> {
    encode(&ServerResponse {
        jsonrpc: crate::JSONRPC_VERSION,
        id,
        result,
        error: None,
    })
}

fn error_response_bytes(error: &JsonRpcError, id: Option<&RawValue>) -> Vec<u8> {
    encode(&ServerResponse {
        jsonrpc: crate::JSONRPC_VERSION,
        id,
        result: None,
        error: Some(error),
    })
}

fn encode(response: &ServerResponse<'_>) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|e| {
        error!(error = %e, "Failed to encode response");
        INTERNAL_ERROR_RESPONSE.to_vec()
    })
}
