mod http;

pub use http::HttpLogStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed error taxonomy for remote-store operations.
///
/// The publisher's retry logic matches over these variants rather than over
/// transport-specific error types: only `InvalidToken` and `NotFound` are
/// worth a rotate-and-retry, everything else is treated as transient.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("continuation token rejected by the service")]
    InvalidToken,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed service response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service error {status}: {message}")]
    Service { status: u16, message: String },
}

impl StoreError {
    /// Whether rotating the stream and retrying once can fix this failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::InvalidToken | StoreError::NotFound(_))
    }
}

/// Summary of one remote container as reported by a list call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub name: String,
}

/// One page of a paginated container listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPage {
    pub containers: Vec<ContainerSummary>,
    /// Present when more pages exist.
    pub next_page_token: Option<String>,
}

/// Summary of one remote stream, including its server-side write position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub name: String,
    /// Absent on a stream that has never been written to.
    pub continuation_token: Option<String>,
}

/// One formatted record in a write payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteEntry {
    /// Record timestamp in epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// Client abstraction over the remote append-only log-stream service.
///
/// All calls are synchronous network round-trips from the caller's point of
/// view; only the single serialized flush task ever invokes them.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// List containers whose name starts with `prefix`, one page at a time.
    async fn list_containers(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> Result<ContainerPage, StoreError>;

    async fn create_container(&self, name: &str) -> Result<(), StoreError>;

    /// List streams in `container` whose name starts with `name_prefix`.
    async fn list_streams(
        &self,
        container: &str,
        name_prefix: &str,
    ) -> Result<Vec<StreamSummary>, StoreError>;

    async fn create_stream(&self, container: &str, name: &str) -> Result<(), StoreError>;

    /// Append `entries` to a stream, proving position with `token` (absent
    /// only for the first write to a fresh stream). Returns the token the
    /// next write must carry.
    async fn write(
        &self,
        container: &str,
        stream: &str,
        entries: &[WriteEntry],
        token: Option<&str>,
    ) -> Result<String, StoreError>;
}
