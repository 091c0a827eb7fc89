//! # HTTP JSON-RPC Server
//!
//! HTTP/1.1 transport for the `rpcwire-json-rpc` engine, built on hyper.
//!
//! The transport is deliberately thin: it reads the POST body, hands it to
//! [`JsonRpcServer::call`](rpcwire_json_rpc::JsonRpcServer::call) and writes the
//! returned bytes back with status `200` and `Content-Type: application/json`.
//! Non-POST requests and empty bodies are answered with a Parse error body.
//!
//! ## Listener modes
//! - [`ListenerMode::Standard`]: keep-alive connections, one tracing span per request
//! - [`ListenerMode::Lean`]: one request per connection, no span

pub mod handler;
pub mod server;

use std::net::SocketAddr;

// Re-export main types
pub use handler::RpcHttpHandler;
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ListenerMode, ServerConfig};

// Re-export foundational types
pub use rpcwire_json_rpc::{JsonRpcHandler, JsonRpcServer, RequestContext};

/// Result type for HTTP server operations
pub type Result<T> = std::result::Result<T, HttpServerError>;

/// HTTP server errors
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
