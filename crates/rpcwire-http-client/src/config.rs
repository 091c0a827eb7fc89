//! HTTP client configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for [`HttpClient`](crate::HttpClient)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint every call is posted to
    pub url: String,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Whole-request timeout
    #[serde(with = "duration_serde", default = "default_timeout")]
    pub timeout: Duration,

    /// User-Agent header value
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            headers: HashMap::new(),
            timeout: default_timeout(),
            user_agent: Some(concat!("rpcwire-http-client/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Serialize durations as milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.headers.is_empty());
        assert!(config.user_agent.unwrap().starts_with("rpcwire-http-client/"));
    }

    #[test]
    fn test_timeout_serializes_as_millis() {
        let config = ClientConfig::new("http://localhost:9000/rpc")
            .with_timeout(Duration::from_millis(1500))
            .with_header("Authorization", "Bearer t");

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 1500);
        assert_eq!(json["headers"]["Authorization"], "Bearer t");

        let back: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"url":"http://rpc.local"}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.headers.is_empty());
        assert!(config.user_agent.is_none());
    }
}
