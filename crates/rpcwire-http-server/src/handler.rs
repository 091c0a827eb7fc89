//! HTTP request handler for JSON-RPC payloads

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_TYPE, HOST};
use http::request::Parts;
use http::{HeaderValue, Method, Request, Response};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use tracing::{Instrument, debug, info_span, warn};

use rpcwire_json_rpc::{JsonRpcServer, RequestContext, parse_error_response};

use crate::server::{ListenerMode, ServerConfig};

/// Turns HTTP requests into engine calls.
///
/// Every request gets `200 OK` with a JSON body: protocol errors travel inside
/// the body, never in the status line.
#[derive(Clone)]
pub struct RpcHttpHandler {
    engine: JsonRpcServer,
    config: Arc<ServerConfig>,
}

impl RpcHttpHandler {
    pub fn new(engine: JsonRpcServer, config: Arc<ServerConfig>) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &JsonRpcServer {
        &self.engine
    }

    /// Handle one HTTP request
    pub async fn handle<B>(&self, req: Request<B>, remote_addr: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let ctx = request_context(&parts, remote_addr);

        let payload = if parts.method != Method::POST {
            debug!(method = %parts.method, "Rejecting non-POST request");
            None
        } else {
            match Limited::new(body, self.config.max_body_size).collect().await {
                Ok(collected) => Some(collected.to_bytes()).filter(|b| !b.is_empty()),
                Err(err) => {
                    warn!(error = %err, "Failed to read request body");
                    None
                }
            }
        };

        let response_body = match payload {
            Some(data) => match self.config.mode {
                ListenerMode::Standard => {
                    let span = info_span!(
                        "handle rpc request",
                        rpc.endpoint = ctx.endpoint.as_deref().unwrap_or_default(),
                        http.method = %parts.method,
                    );
                    self.engine.call(ctx, &data).instrument(span).await
                }
                ListenerMode::Lean => self.engine.call(ctx, &data).await,
            },
            None => parse_error_response(),
        };

        let mut response = Response::new(Full::new(Bytes::from(response_body)));
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if self.config.mode == ListenerMode::Lean {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }
        response
    }
}

fn request_context(parts: &Parts, remote_addr: Option<SocketAddr>) -> RequestContext {
    let host = parts
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.host())
        .unwrap_or_default();

    let mut ctx = RequestContext::new().with_endpoint(format!("{}{}", host, parts.uri.path()));
    if let Some(addr) = remote_addr {
        ctx = ctx.with_remote_addr(addr);
    }
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            ctx = ctx.with_metadata(name.as_str(), value);
        }
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcwire_json_rpc::{HandlerResult, to_result};
    use serde_json::value::RawValue;

    async fn whoami(ctx: RequestContext, _params: Option<Box<RawValue>>) -> HandlerResult {
        to_result(&ctx.endpoint)
    }

    fn handler(mode: ListenerMode) -> RpcHttpHandler {
        let engine = JsonRpcServer::builder().method("whoami", whoami).build();
        let config = ServerConfig {
            mode,
            max_body_size: 256,
            ..Default::default()
        };
        RpcHttpHandler::new(engine, Arc::new(config))
    }

    fn request(method: Method, body: impl Into<Bytes>) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri("/rpc")
            .header(HOST, "example.test")
            .body(Full::new(body.into()))
            .unwrap()
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const PARSE_ERROR: &str =
        r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#;

    #[tokio::test]
    async fn test_post_is_dispatched() {
        let response = handler(ListenerMode::Standard)
            .handle(
                request(Method::POST, r#"{"jsonrpc":"2.0","method":"whoami","id":1}"#),
                None,
            )
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert!(response.headers().get(CONNECTION).is_none());
        assert_eq!(
            body_string(response).await,
            r#"{"jsonrpc":"2.0","id":1,"result":"example.test/rpc"}"#
        );
    }

    #[tokio::test]
    async fn test_non_post_is_parse_error() {
        let response = handler(ListenerMode::Standard)
            .handle(request(Method::GET, ""), None)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let response = handler(ListenerMode::Standard)
            .handle(request(Method::POST, ""), None)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_oversized_body_is_parse_error() {
        let body = format!(
            r#"{{"jsonrpc":"2.0","method":"whoami","params":"{}","id":1}}"#,
            "x".repeat(512)
        );
        let response = handler(ListenerMode::Standard)
            .handle(request(Method::POST, body), None)
            .await;

        assert_eq!(body_string(response).await, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_protocol_error_keeps_status_200() {
        let response = handler(ListenerMode::Standard)
            .handle(
                request(Method::POST, r#"{"jsonrpc":"2.0","method":"missing","id":"q"}"#),
                None,
            )
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(
            body_string(response).await,
            r#"{"jsonrpc":"2.0","id":"q","error":{"code":-32601,"message":"Method not found"}}"#
        );
    }

    #[tokio::test]
    async fn test_lean_mode_closes_connection() {
        let response = handler(ListenerMode::Lean)
            .handle(
                request(Method::POST, r#"{"jsonrpc":"2.0","method":"whoami","id":1}"#),
                None,
            )
            .await;

        assert_eq!(response.headers()[CONNECTION], "close");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_request_context_from_parts() {
        let (parts, _) = Request::builder()
            .method(Method::POST)
            .uri("/api")
            .header(HOST, "rpc.local:8080")
            .header("x-request-id", "abc")
            .body(())
            .unwrap()
            .into_parts();
        let addr: SocketAddr = "10.0.0.1:4000".parse().unwrap();

        let ctx = request_context(&parts, Some(addr));
        assert_eq!(ctx.endpoint.as_deref(), Some("rpc.local:8080/api"));
        assert_eq!(ctx.remote_addr, Some(addr));
        assert_eq!(ctx.metadata("x-request-id"), Some("abc"));
    }
}
