//! # JSON-RPC HTTP Client
//!
//! Posts JSON-RPC 2.0 calls and batches to one HTTP endpoint.
//!
//! - Every call gets a fresh correlation id from an [`IdGenerator`](rpcwire_json_rpc::IdGenerator)
//!   (random UUIDs by default).
//! - Only `200 OK` is accepted; anything else is [`ClientError::Status`].
//! - An error object in a single-call response becomes [`ClientError::Rpc`].
//! - Batch responses are matched to their requests by id and returned in request order.
//!
//! ```rust,no_run
//! use rpcwire_http_client::HttpClient;
//!
//! # async fn run() -> rpcwire_http_client::ClientResult<()> {
//! let client = HttpClient::new("http://127.0.0.1:8000")?;
//! let response = client.call("add", &serde_json::json!({"a": 1, "b": 2})).await?;
//! let sum: i64 = response.get_result()?;
//! assert_eq!(sum, 3);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
