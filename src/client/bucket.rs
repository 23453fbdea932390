use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use super::{ClientError, N1qlQuery, QueryMetrics, QueryResult, QueryService};
use crate::config::{ConnectionString, CouchbaseOptions};

/// HTTP client for one bucket's query service.
pub struct Bucket {
    // Bucket the connection string named.
    name: String,
    // `{scheme}://{host}:{port}/query/service`
    endpoint: Url,
    http_client: reqwest::Client,
    closed: AtomicBool,
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.as_str())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    code: u32,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(rename = "requestID", default)]
    request_id: String,
    #[serde(default)]
    results: Vec<JsonValue>,
    #[serde(default)]
    errors: Vec<ServiceError>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    metrics: Option<QueryMetrics>,
}

impl Bucket {
    /// Build a client for the query service behind `conn`.
    ///
    /// No request is made here; the first round trip happens on the first query.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidEndpoint` if host/scheme do not form a URL,
    /// or `ClientError::Http` if the HTTP client cannot be built.
    pub fn connect(conn: &ConnectionString, opts: &CouchbaseOptions) -> Result<Self, ClientError> {
        let raw = format!(
            "{}://{}:{}/query/service",
            opts.http_scheme, conn.host, opts.query_port
        );
        let endpoint = Url::parse(&raw).map_err(|e| ClientError::InvalidEndpoint(format!("{raw}: {e}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            name: conn.bucket.clone(),
            endpoint,
            http_client: builder.build()?,
            closed: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryService for Bucket {
    async fn n1ql_query(&self, query: &N1qlQuery) -> Result<QueryResult, ClientError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // The service reports statement errors in the body, usually with a 4xx/5xx status.
        let raw: RawResponse = match serde_json::from_str(&body) {
            Ok(raw) => raw,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Err(e) => return Err(ClientError::Decode(e)),
        };

        if let Some(err) = service_error(raw.errors) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!(
            request_id = %raw.request_id,
            rows = raw.results.len(),
            "query service responded"
        );

        Ok(QueryResult {
            request_id: raw.request_id,
            rows: raw.results,
            status: raw.status,
            metrics: raw.metrics,
        })
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// The first entry decides the code; later entries are appended to its message.
fn service_error(errors: Vec<ServiceError>) -> Option<ClientError> {
    let mut errors = errors.into_iter();
    let first = errors.next()?;
    let mut msg = first.msg;
    for extra in errors {
        msg.push_str(&format!("; [{}] {}", extra.code, extra.msg));
    }
    Some(ClientError::Service {
        code: first.code,
        msg,
    })
}
