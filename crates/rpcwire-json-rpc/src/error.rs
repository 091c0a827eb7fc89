use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;
use thiserror::Error;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// -32000, shared by the fixed "Server error" and ad-hoc message errors
    ServerError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError => crate::error_codes::SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal JSON-RPC error",
            JsonRpcErrorCode::ServerError => "Server error",
        }
    }

    /// Map a numeric code back onto the fixed taxonomy.
    /// Application-defined codes return `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            crate::error_codes::PARSE_ERROR => Some(JsonRpcErrorCode::ParseError),
            crate::error_codes::INVALID_REQUEST => Some(JsonRpcErrorCode::InvalidRequest),
            crate::error_codes::METHOD_NOT_FOUND => Some(JsonRpcErrorCode::MethodNotFound),
            crate::error_codes::INVALID_PARAMS => Some(JsonRpcErrorCode::InvalidParams),
            crate::error_codes::INTERNAL_ERROR => Some(JsonRpcErrorCode::InternalError),
            crate::error_codes::SERVER_ERROR => Some(JsonRpcErrorCode::ServerError),
            _ => None,
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC error object, as carried in the `error` member of a response.
///
/// `data` is kept as the raw JSON span it was built from or received as; it is
/// never re-encoded on its way through the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("Error [{code}]: {message}")]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<RawValue>>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_code(code: JsonRpcErrorCode) -> Self {
        Self::new(code.code(), code.message())
    }

    /// Ad-hoc application error with the generic server code (-32000).
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::ServerError.code(), message)
    }

    pub fn parse_error() -> Self {
        Self::from_code(JsonRpcErrorCode::ParseError)
    }

    pub fn invalid_request() -> Self {
        Self::from_code(JsonRpcErrorCode::InvalidRequest)
    }

    pub fn method_not_found() -> Self {
        Self::from_code(JsonRpcErrorCode::MethodNotFound)
    }

    pub fn invalid_params() -> Self {
        Self::from_code(JsonRpcErrorCode::InvalidParams)
    }

    pub fn internal_error() -> Self {
        Self::from_code(JsonRpcErrorCode::InternalError)
    }

    pub fn server_error() -> Self {
        Self::from_code(JsonRpcErrorCode::ServerError)
    }

    /// Attach an already-serialized data payload.
    pub fn with_data(mut self, data: Box<RawValue>) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize `data` and attach it.
    pub fn with_data_value<T: Serialize + ?Sized>(self, data: &T) -> Result<Self, serde_json::Error> {
        let raw = serde_json::value::to_raw_value(data)?;
        Ok(self.with_data(raw))
    }

    /// The fixed taxonomy entry for this error, if the code belongs to it.
    pub fn kind(&self) -> Option<JsonRpcErrorCode> {
        JsonRpcErrorCode::from_code(self.code)
    }

    /// Raw JSON text of the data payload.
    pub fn data_json(&self) -> Option<&str> {
        self.data.as_deref().map(RawValue::get)
    }
}

impl PartialEq for JsonRpcError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.message == other.message
            && self.data_json() == other.data_json()
    }
}

impl Eq for JsonRpcError {}

impl From<JsonRpcErrorCode> for JsonRpcError {
    fn from(code: JsonRpcErrorCode) -> Self {
        Self::from_code(code)
    }
}

/// Result type for client-side building and correlation
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Client-side protocol errors (building requests, correlating responses)
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON-RPC request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSON-RPC response version: {0:?}")]
    InvalidVersion(String),

    #[error("Invalid JSON-RPC response: {0}")]
    InvalidResponse(String),

    #[error("Response for batch request {0} not returned")]
    MissingResponse(String),

    #[error("Response carries no result")]
    MissingResult,

    #[error(transparent)]
    Rpc(#[from] JsonRpcError),
}
