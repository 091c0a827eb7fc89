use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{JsonRpcVersion, RequestId};

/// A client-side JSON-RPC request.
///
/// `params` is carried as an already-serialized JSON span; `id` is left unset
/// until the request is about to be sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    /// Build an unsent request without an id.
    pub fn new(method: impl Into<String>, params: Option<Box<RawValue>>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(method: impl Into<String>) -> Self {
        Self::new(method, None)
    }

    /// Build a request from any serializable params value.
    pub fn with_params<P>(method: impl Into<String>, params: &P) -> ProtocolResult<Self>
    where
        P: Serialize + ?Sized,
    {
        let raw = serde_json::value::to_raw_value(params)?;
        Ok(Self::new(method, Some(raw)))
    }

    pub fn with_id(mut self, id: impl Into<RequestId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Raw JSON text of the params, if any.
    pub fn params_json(&self) -> Option<&str> {
        self.params.as_deref().map(RawValue::get)
    }

    pub fn validate(&self) -> ProtocolResult<()> {
        if self.method.is_empty() {
            return Err(ProtocolError::InvalidRequest(
                "method must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serialize a single request with a caller-supplied id.
pub fn new_request_bytes<P>(
    method: impl Into<String>,
    params: &P,
    id: impl Into<RequestId>,
) -> ProtocolResult<Vec<u8>>
where
    P: Serialize + ?Sized,
{
    let request = JsonRpcRequest::with_params(method, params)?.with_id(id);
    request.validate()?;
    Ok(serde_json::to_vec(&request)?)
}

/// Serialize an ordered batch of requests as a JSON array.
pub fn new_batch_request_bytes(requests: &[JsonRpcRequest]) -> ProtocolResult<Vec<u8>> {
    for request in requests {
        request.validate()?;
    }
    Ok(serde_json::to_vec(requests)?)
}
