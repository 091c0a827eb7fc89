use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::error::{JsonRpcError, ProtocolError, ProtocolResult};
use crate::request::JsonRpcRequest;
use crate::types::RequestId;

/// A client-side JSON-RPC response.
///
/// The version is kept as received so that a bad version surfaces as
/// [`ProtocolError::InvalidVersion`] rather than as a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc", default)]
    pub version: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

// `"result": null` is a present (null) result, not a missing one.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl JsonRpcResponse {
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.version != crate::JSONRPC_VERSION {
            return Err(ProtocolError::InvalidVersion(self.version.clone()));
        }
        // Neither is allowed: a handler may answer with an empty envelope.
        if self.result.is_some() && self.error.is_some() {
            return Err(ProtocolError::InvalidResponse(
                "both result and error are present".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Decode the raw `result` payload into `T`.
    pub fn get_result<T: DeserializeOwned>(&self) -> ProtocolResult<T> {
        let raw = self.result.as_deref().ok_or(ProtocolError::MissingResult)?;
        Ok(serde_json::from_str(raw.get())?)
    }

    /// Raw JSON text of the result, if any.
    pub fn result_json(&self) -> Option<&str> {
        self.result.as_deref().map(RawValue::get)
    }

    /// Turn an error response into `Err`, leaving success responses untouched.
    pub fn into_result(self) -> ProtocolResult<Self> {
        match self.error {
            Some(error) => Err(ProtocolError::Rpc(error)),
            None => Ok(self),
        }
    }
}

/// Parse a single response object.
pub fn parse_response(data: &[u8]) -> ProtocolResult<JsonRpcResponse> {
    let response: JsonRpcResponse = serde_json::from_slice(data)?;
    response.validate()?;
    Ok(response)
}

/// Parse a batch response and align it with the requests that produced it.
///
/// The `i`-th element of the result answers `requests[i]`, whatever order the
/// server returned them in. A request without a matching response, or a matched
/// response with a bad version, fails the whole batch.
pub fn parse_batch_response(
    requests: &[JsonRpcRequest],
    data: &[u8],
) -> ProtocolResult<Vec<JsonRpcResponse>> {
    let parsed: Vec<JsonRpcResponse> = serde_json::from_slice(data)?;

    let mut by_id: HashMap<Option<RequestId>, JsonRpcResponse> =
        HashMap::with_capacity(parsed.len());
    for response in parsed {
        by_id.insert(response.id.clone(), response);
    }

    requests
        .iter()
        .map(|request| {
            let response = by_id
                .get(&request.id)
                .cloned()
                .ok_or_else(|| ProtocolError::MissingResponse(display_id(request.id.as_ref())))?;
            response.validate()?;
            Ok(response)
        })
        .collect()
}

/// Find the response answering `request` in an uncorrelated list.
pub fn find_response<'a>(
    responses: &'a [JsonRpcResponse],
    request: &JsonRpcRequest,
) -> Option<&'a JsonRpcResponse> {
    responses.iter().find(|response| response.id == request.id)
}

fn display_id(id: Option<&RequestId>) -> String {
    id.map_or_else(|| "null".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(method: &str, id: &str) -> JsonRpcRequest {
        JsonRpcRequest::new_no_params(method).with_id(id)
    }

    #[test]
    fn test_parse_response() {
        let response =
            parse_response(br#"{"jsonrpc":"2.0","id":"1","result":{"foo":"bar"}}"#).unwrap();
        assert_eq!(response.id, Some(RequestId::from("1")));
        let value: serde_json::Value = response.get_result().unwrap();
        assert_eq!(value, json!({"foo": "bar"}));
    }

    #[test]
    fn test_parse_response_rejects_bad_version() {
        let result = parse_response(br#"{"jsonrpc":"1.0","id":1,"result":true}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidVersion(v)) if v == "1.0"));

        let result = parse_response(br#"{"id":1,"result":true}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidVersion(_))));
    }

    #[test]
    fn test_parse_response_rejects_result_with_error() {
        let result = parse_response(
            br#"{"jsonrpc":"2.0","id":1,"result":true,"error":{"code":-32603,"message":"Internal JSON-RPC error"}}"#,
        );
        assert!(matches!(result, Err(ProtocolError::InvalidResponse(_))));

        let empty = parse_response(br#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(empty.result.is_none());
        assert!(empty.error.is_none());
    }

    #[test]
    fn test_parse_response_accepts_wide_numeric_ids() {
        let response = parse_response(br#"{"jsonrpc":"2.0","id":1.5,"result":true}"#).unwrap();
        assert_eq!(response.id.unwrap().to_string(), "1.5");

        let response =
            parse_response(br#"{"jsonrpc":"2.0","id":18446744073709551615,"result":true}"#)
                .unwrap();
        assert_eq!(response.id.unwrap().to_string(), "18446744073709551615");
    }

    #[test]
    fn test_parse_response_rejects_malformed_json() {
        let result = parse_response(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_round_trip_keeps_id_type_and_payloads() {
        let original = JsonRpcResponse {
            version: "2.0".to_string(),
            id: Some(RequestId::String("42".to_string())),
            result: Some(RawValue::from_string(r#"{"n":1.50}"#.to_string()).unwrap()),
            error: None,
        };
        let bytes = serde_json::to_vec(&original).unwrap();
        let parsed = parse_response(&bytes).unwrap();
        assert_eq!(parsed.id, original.id);
        assert_eq!(parsed.result_json(), Some(r#"{"n":1.50}"#));
        assert!(parsed.error.is_none());

        let original = JsonRpcResponse {
            version: "2.0".to_string(),
            id: Some(RequestId::Number(42)),
            result: None,
            error: Some(JsonRpcError::new(7, "seven").with_data_value(&[1, 2]).unwrap()),
        };
        let bytes = serde_json::to_vec(&original).unwrap();
        let parsed = parse_response(&bytes).unwrap();
        assert_eq!(parsed.id, Some(RequestId::Number(42)));
        assert_eq!(parsed.error, original.error);
        assert!(parsed.result.is_none());
    }

    #[test]
    fn test_get_result_on_error_response() {
        let response = parse_response(
            br#"{"jsonrpc":"2.0","id":"a","error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert!(response.is_error());
        assert!(matches!(
            response.get_result::<String>(),
            Err(ProtocolError::MissingResult)
        ));
        let error = response.into_result().unwrap_err();
        assert!(matches!(error, ProtocolError::Rpc(e) if e.code == -32601));
    }

    #[test]
    fn test_get_result_shape_mismatch() {
        let response = parse_response(br#"{"jsonrpc":"2.0","id":"a","result":"text"}"#).unwrap();
        assert!(matches!(
            response.get_result::<u32>(),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_null_result_is_present() {
        let response = parse_response(br#"{"jsonrpc":"2.0","id":"a","result":null}"#).unwrap();
        assert_eq!(response.result_json(), Some("null"));
        response.get_result::<()>().unwrap();
    }

    #[test]
    fn test_batch_response_is_realigned() {
        let requests = vec![request("a", "1"), request("b", "2"), request("c", "3")];
        let data = br#"[
            {"jsonrpc":"2.0","id":"3","result":"c"},
            {"jsonrpc":"2.0","id":"1","result":"a"},
            {"jsonrpc":"2.0","id":"2","error":{"code":-32000,"message":"b failed"}}
        ]"#;

        let responses = parse_batch_response(&requests, data).unwrap();
        assert_eq!(responses.len(), requests.len());
        assert_eq!(responses[0].get_result::<String>().unwrap(), "a");
        assert_eq!(responses[1].error.as_ref().unwrap().message, "b failed");
        assert_eq!(responses[2].get_result::<String>().unwrap(), "c");
    }

    #[test]
    fn test_batch_response_missing_entry_fails() {
        let requests = vec![request("a", "1"), request("b", "2")];
        let data = br#"[{"jsonrpc":"2.0","id":"1","result":"a"}]"#;

        let result = parse_batch_response(&requests, data);
        assert!(matches!(result, Err(ProtocolError::MissingResponse(id)) if id == "2"));
    }

    #[test]
    fn test_batch_response_invalid_version_fails() {
        let requests = vec![request("a", "1"), request("b", "2")];
        let data = br#"[
            {"jsonrpc":"2.0","id":"1","result":"a"},
            {"jsonrpc":"1.0","id":"2","result":"b"}
        ]"#;

        let result = parse_batch_response(&requests, data);
        assert!(matches!(result, Err(ProtocolError::InvalidVersion(_))));
    }

    #[test]
    fn test_batch_response_with_result_and_error_fails() {
        let requests = vec![request("a", "1")];
        let data = br#"[{"jsonrpc":"2.0","id":"1","result":"a","error":{"code":-32000,"message":"x"}}]"#;

        let result = parse_batch_response(&requests, data);
        assert!(matches!(result, Err(ProtocolError::InvalidResponse(_))));
    }

    #[test]
    fn test_batch_response_tolerates_unrelated_float_ids() {
        let requests = vec![request("a", "1")];
        let data = br#"[{"jsonrpc":"2.0","id":2.5,"result":"x"},{"jsonrpc":"2.0","id":"1","result":"a"}]"#;

        let responses = parse_batch_response(&requests, data).unwrap();
        assert_eq!(responses[0].get_result::<String>().unwrap(), "a");
    }

    #[test]
    fn test_batch_response_does_not_coerce_id_types() {
        let requests = vec![JsonRpcRequest::new_no_params("a").with_id(1i64)];
        let data = br#"[{"jsonrpc":"2.0","id":"1","result":"a"}]"#;

        assert!(parse_batch_response(&requests, data).is_err());
    }

    #[test]
    fn test_find_response() {
        let requests = vec![request("a", "1"), request("b", "2")];
        let responses: Vec<JsonRpcResponse> = serde_json::from_str(
            r#"[{"jsonrpc":"2.0","id":"2","result":2},{"jsonrpc":"2.0","id":"1","result":1}]"#,
        )
        .unwrap();

        let found = find_response(&responses, &requests[0]).unwrap();
        assert_eq!(found.get_result::<i32>().unwrap(), 1);
        assert!(find_response(&responses, &request("c", "3")).is_none());
    }
}
