//! JSON-RPC over HTTP POST

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use rpcwire_json_rpc::{
    IdGenerator, JsonRpcRequest, JsonRpcResponse, UuidIdGenerator, new_batch_request_bytes,
    new_request_bytes, parse_batch_response, parse_response,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// HTTP client for a single JSON-RPC endpoint
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    url: Url,
    headers: HeaderMap,
    id_generator: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a client for `url` with default settings
    pub fn new(url: &str) -> ClientResult<Self> {
        Self::with_config(ClientConfig::new(url))
    }

    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let url = Url::parse(&config.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "Invalid scheme for HTTP client: {}",
                url.scheme()
            )));
        }

        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url,
            headers: header_map(&config.headers)?,
            id_generator: Arc::new(UuidIdGenerator),
        })
    }

    /// Replace the ID generator used for outgoing calls
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Replace the extra headers sent with every request
    pub fn set_headers(&mut self, headers: &HashMap<String, String>) -> ClientResult<()> {
        self.headers = header_map(headers)?;
        Ok(())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Call `method` with `params` under a fresh id.
    ///
    /// A response carrying an error object comes back as [`ClientError::Rpc`],
    /// so callers can branch on its code.
    pub async fn call<P>(&self, method: &str, params: &P) -> ClientResult<JsonRpcResponse>
    where
        P: Serialize + ?Sized,
    {
        let id = self.id_generator.next_id();
        debug!(method, id = %id, "Sending JSON-RPC call");

        let body = new_request_bytes(method, params, id)?;
        let data = self.post(body).await?;

        let mut response = parse_response(&data)?;
        match response.error.take() {
            Some(error) => {
                debug!(method, code = error.code, "JSON-RPC call returned an error");
                Err(ClientError::Rpc(error))
            }
            None => Ok(response),
        }
    }

    /// Send `requests` as one batch, each under a fresh id.
    ///
    /// The `i`-th response answers the `i`-th request. Per-element error
    /// objects are left in place for the caller to inspect.
    pub async fn call_batch(
        &self,
        requests: Vec<JsonRpcRequest>,
    ) -> ClientResult<Vec<JsonRpcResponse>> {
        let requests: Vec<JsonRpcRequest> = requests
            .into_iter()
            .map(|request| request.with_id(self.id_generator.next_id()))
            .collect();
        debug!(size = requests.len(), "Sending JSON-RPC batch");

        let body = new_batch_request_bytes(&requests)?;
        let data = self.post(body).await?;

        Ok(parse_batch_response(&requests, &data)?)
    }

    /// JSON content headers, overridden by any configured header of the same name
    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.headers.len() + 2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    async fn post(&self, body: Vec<u8>) -> ClientResult<Bytes> {
        let response = self
            .client
            .post(self.url.clone())
            .headers(self.request_headers())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), url = %self.url, "Unexpected HTTP status");
            return Err(ClientError::Status(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}

fn header_map(headers: &HashMap<String, String>) -> ClientResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::config(format!("Invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::config(format!("Invalid header value for {}: {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}
