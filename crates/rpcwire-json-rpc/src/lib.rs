//! # JSON-RPC 2.0 Engine
//!
//! A transport-agnostic JSON-RPC 2.0 implementation. Transports hand the
//! engine `(context, raw bytes)` and write back whatever bytes it returns.
//!
//! ## Server side
//! - [`JsonRpcServer::call`] parses a single request or a batch, dispatches to the
//!   registered handlers and returns the encoded response. It never fails: parse
//!   errors, unknown methods and panicking handlers all become error responses.
//! - Batch elements run as separate tokio tasks and come back in request order,
//!   so [`JsonRpcServer::call`] must be awaited inside a tokio runtime.
//! - Request ids are echoed byte-for-byte.
//!
//! ## Client side
//! - [`JsonRpcRequest`], [`new_request_bytes`] and [`new_batch_request_bytes`] build payloads.
//! - [`parse_response`] and [`parse_batch_response`] validate responses and line
//!   batch responses up with the requests that produced them.
//! - [`IdGenerator`] supplies correlation ids.
//!
//! ```rust
//! use rpcwire_json_rpc::prelude::*;
//! use serde_json::value::RawValue;
//!
//! async fn ping(_ctx: RequestContext, _params: Option<Box<RawValue>>) -> HandlerResult {
//!     to_result("pong")
//! }
//!
//! # async fn run() {
//! let server = JsonRpcServer::builder().method("ping", ping).build();
//! let response = server
//!     .call(RequestContext::new(), br#"{"jsonrpc":"2.0","method":"ping","id":1}"#)
//!     .await;
//! assert_eq!(response, br#"{"jsonrpc":"2.0","id":1,"result":"pong"}"#);
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod id;
pub mod request;
pub mod response;
pub mod types;

pub mod prelude;

// Re-export main types
pub use dispatch::{JsonRpcServer, JsonRpcServerBuilder, MethodTable, parse_error_response};
pub use error::{JsonRpcError, JsonRpcErrorCode, ProtocolError, ProtocolResult};
pub use handler::{
    FunctionHandler, HandlerResult, JsonRpcHandler, RequestContext, parse_params, to_result,
};
pub use id::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use request::{JsonRpcRequest, new_batch_request_bytes, new_request_bytes};
pub use response::{JsonRpcResponse, find_response, parse_batch_response, parse_response};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const SERVER_ERROR: i64 = -32000;
}
