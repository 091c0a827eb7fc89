//! Error types for HTTP client operations

use rpcwire_json_rpc::{JsonRpcError, ProtocolError};
use thiserror::Error;

/// Result type for HTTP client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error type for HTTP client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network/connection errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something other than 200
    #[error("Invalid status code: {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed, mismatched or incomplete responses
    #[error("Protocol error: {0}")]
    Protocol(ProtocolError),

    /// The server returned a JSON-RPC error object
    #[error(transparent)]
    Rpc(JsonRpcError),
}

impl ClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The JSON-RPC error object, if the server returned one
    pub fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self {
            Self::Rpc(error) => Some(error),
            _ => None,
        }
    }

    /// Get the JSON-RPC error code if the server returned an error object
    pub fn error_code(&self) -> Option<i64> {
        self.rpc_error().map(|error| error.code)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(error: ProtocolError) -> Self {
        match error {
            ProtocolError::Rpc(error) => Self::Rpc(error),
            other => Self::Protocol(other),
        }
    }
}

impl From<JsonRpcError> for ClientError {
    fn from(error: JsonRpcError) -> Self {
        Self::Rpc(error)
    }
}
