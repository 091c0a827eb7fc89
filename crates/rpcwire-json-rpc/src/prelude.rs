//! # JSON-RPC Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use rpcwire_json_rpc::prelude::*;
//! ```

pub use crate::dispatch::{JsonRpcServer, JsonRpcServerBuilder};
pub use crate::error::{JsonRpcError, JsonRpcErrorCode, ProtocolError, ProtocolResult};
pub use crate::handler::{
    HandlerResult, JsonRpcHandler, RequestContext, parse_params, to_result,
};
pub use crate::id::{IdGenerator, UuidIdGenerator};
pub use crate::request::{JsonRpcRequest, new_batch_request_bytes, new_request_bytes};
pub use crate::response::{JsonRpcResponse, parse_batch_response, parse_response};
pub use crate::types::RequestId;

// Standard error codes
pub use crate::error_codes::*;
