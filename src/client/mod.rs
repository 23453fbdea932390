// Native query service client
//
// - bucket: HTTP client for the N1QL query service (`/query/service`)
//
// Everything above this module talks to the service through the `QueryService`
// trait, so tests can swap in an in-memory implementation.

pub mod bucket;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::error::N1qlMiddlewareDbError;

pub use bucket::Bucket;

/// Errors raised by the native client before classification.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("[{code}] {msg}")]
    Service { code: u32, msg: String },

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error("Invalid query service endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("client is closed")]
    Closed,
}

/// A N1QL statement with its positional arguments, as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N1qlQuery {
    pub statement: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<JsonValue>,
}

impl N1qlQuery {
    pub fn new(statement: impl Into<String>, args: Vec<JsonValue>) -> Self {
        Self {
            statement: statement.into(),
            args,
        }
    }
}

/// Execution metrics reported alongside a result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetrics {
    #[serde(default)]
    pub elapsed_time: String,
    #[serde(default)]
    pub execution_time: String,
    #[serde(default)]
    pub result_count: u64,
    #[serde(default)]
    pub result_size: u64,
    #[serde(default)]
    pub mutation_count: Option<u64>,
}

/// Rows and metadata returned by one query.
///
/// Rows are handed back exactly as the service produced them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "requestID", default)]
    pub request_id: String,
    #[serde(rename = "results", default)]
    pub rows: Vec<JsonValue>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metrics: Option<QueryMetrics>,
}

impl QueryResult {
    /// Build a result from rows alone, as an in-memory service would.
    #[must_use]
    pub fn from_rows(rows: Vec<JsonValue>) -> Self {
        Self {
            status: "success".to_string(),
            rows,
            ..Self::default()
        }
    }

    /// The only row of the result.
    ///
    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::DataError` when the result holds zero
    /// rows or more than one.
    pub fn get_single_result(&self) -> Result<&JsonValue, N1qlMiddlewareDbError> {
        match self.rows.as_slice() {
            [row] => Ok(row),
            rows => Err(N1qlMiddlewareDbError::DataError(format!(
                "Expected exactly one row, query returned {}",
                rows.len()
            ))),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JsonValue> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a JsonValue;
    type IntoIter = std::slice::Iter<'a, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = JsonValue;
    type IntoIter = std::vec::IntoIter<JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// The native query client a [`crate::Connection`] drives.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Run one statement and wait for its complete result.
    async fn n1ql_query(&self, query: &N1qlQuery) -> Result<QueryResult, ClientError>;

    /// Release the client. Later queries fail with [`ClientError::Closed`].
    async fn close(&self) -> Result<(), ClientError>;
}
