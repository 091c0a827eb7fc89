//! HTTP JSON-RPC server: configuration, builder and accept loop.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::value::RawValue;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use rpcwire_json_rpc::{HandlerResult, JsonRpcHandler, JsonRpcServer, JsonRpcServerBuilder, RequestContext};

use crate::{HttpServerError, Result, RpcHttpHandler};

/// How connections are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerMode {
    /// Keep-alive connections; each request runs inside a tracing span
    #[default]
    Standard,
    /// One request per connection, no per-request span
    Lean,
}

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Maximum request body size
    pub max_body_size: usize,
    /// Connection handling mode
    pub mode: ListenerMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_body_size: 1024 * 1024, // 1MB
            mode: ListenerMode::Standard,
        }
    }
}

/// Builder for [`HttpRpcServer`]
pub struct HttpRpcServerBuilder {
    config: ServerConfig,
    engine: Option<JsonRpcServer>,
    methods: JsonRpcServerBuilder,
}

impl HttpRpcServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            engine: None,
            methods: JsonRpcServerBuilder::new(),
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn mode(mut self, mode: ListenerMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Use an already-built engine. Methods registered on this builder are ignored.
    pub fn engine(mut self, engine: JsonRpcServer) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Register a JSON-RPC handler for a method
    pub fn handler<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: JsonRpcHandler + 'static,
    {
        self.methods = self.methods.handler(method, handler);
        self
    }

    /// Register an async fn or closure for a method
    pub fn method<F, Fut>(mut self, method: impl Into<String>, handler_fn: F) -> Self
    where
        F: Fn(RequestContext, Option<Box<RawValue>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.methods = self.methods.method(method, handler_fn);
        self
    }

    /// Build the HTTP JSON-RPC server
    pub fn build(self) -> HttpRpcServer {
        let engine = self.engine.unwrap_or_else(|| self.methods.build());
        let config = Arc::new(self.config);
        HttpRpcServer {
            handler: RpcHttpHandler::new(engine, Arc::clone(&config)),
            config,
        }
    }
}

impl Default for HttpRpcServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP transport around a [`JsonRpcServer`]
#[derive(Clone)]
pub struct HttpRpcServer {
    config: Arc<ServerConfig>,
    handler: RpcHttpHandler,
}

impl HttpRpcServer {
    pub fn builder() -> HttpRpcServerBuilder {
        HttpRpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn handler(&self) -> &RpcHttpHandler {
        &self.handler
    }

    /// Bind to the configured address and serve forever
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HttpServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(
            "JSON-RPC server listening on {} ({:?} mode)",
            listener.local_addr()?,
            self.config.mode
        );

        let keep_alive = self.config.mode == ListenerMode::Standard;
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler.handle(req, Some(peer_addr)).await) }
                });

                let mut builder = http1::Builder::new();
                builder.keep_alive(keep_alive);
                if let Err(err) = builder.serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.mode, ListenerMode::Standard);
    }

    #[test]
    fn test_builder() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 3000);
        let server = HttpRpcServer::builder()
            .bind_address(addr)
            .max_body_size(2048)
            .mode(ListenerMode::Lean)
            .method("ping", |_ctx: RequestContext, _params: Option<Box<RawValue>>| async {
                rpcwire_json_rpc::to_result("pong")
            })
            .build();

        assert_eq!(server.config().bind_address, addr);
        assert_eq!(server.config().max_body_size, 2048);
        assert_eq!(server.config().mode, ListenerMode::Lean);
        assert!(server.handler().engine().has_method("ping"));
    }

    #[test]
    fn test_prebuilt_engine_wins() {
        let engine = JsonRpcServer::builder()
            .method("a", |_ctx: RequestContext, _params: Option<Box<RawValue>>| async { Ok(None) })
            .build();
        let server = HttpRpcServer::builder()
            .engine(engine)
            .method("b", |_ctx: RequestContext, _params: Option<Box<RawValue>>| async { Ok(None) })
            .build();

        assert!(server.handler().engine().has_method("a"));
        assert!(!server.handler().engine().has_method("b"));
    }
}
