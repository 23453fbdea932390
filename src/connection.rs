//! Connection and cursor adapters over the native query client.
//!
//! A [`Connection`] owns one [`QueryService`] handle. A [`Cursor`] borrows its
//! connection, so the borrow checker keeps every cursor from outliving the
//! connection's `close`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::client::{Bucket, N1qlQuery, QueryResult, QueryService};
use crate::config::{ConnectionString, CouchbaseOptions};
use crate::error::N1qlMiddlewareDbError;
use crate::translation::{QueryOptions, translate_placeholders};
use crate::types::{RowValues, convert_params};

/// One logical connection to a bucket's query service.
pub struct Connection {
    service: Option<Arc<dyn QueryService>>,
    translate_placeholders: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("translate_placeholders", &self.translate_placeholders)
            .finish()
    }
}

impl Connection {
    /// Open a connection to the query service named by `conn`.
    ///
    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::ConfigError` if the endpoint cannot be
    /// formed, or `OperationalError` if the HTTP client cannot be built.
    pub fn open(
        conn: &ConnectionString,
        opts: &CouchbaseOptions,
    ) -> Result<Self, N1qlMiddlewareDbError> {
        let bucket = Bucket::connect(conn, opts)?;
        tracing::debug!(connection = %conn, endpoint = %bucket.endpoint(), "opened connection");
        Ok(Self::with_service(Arc::new(bucket)).with_translation(opts.translate_placeholders))
    }

    /// Wrap an already-built query client.
    #[must_use]
    pub fn with_service(service: Arc<dyn QueryService>) -> Self {
        Self {
            service: Some(service),
            translate_placeholders: false,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translate_placeholders: bool) -> Self {
        self.translate_placeholders = translate_placeholders;
        self
    }

    /// Create a fresh cursor bound to this connection.
    ///
    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::InterfaceError` once the connection is closed.
    pub fn cursor(&self) -> Result<Cursor<'_>, N1qlMiddlewareDbError> {
        self.service()?;
        Ok(Cursor {
            connection: self,
            result: None,
        })
    }

    /// Release the query client. Closing an already closed connection is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates a classified error if the native client fails to close.
    pub async fn close(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        if let Some(service) = self.service.take() {
            service.close().await?;
            tracing::debug!("closed connection");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.service.is_none()
    }

    fn service(&self) -> Result<&Arc<dyn QueryService>, N1qlMiddlewareDbError> {
        self.service
            .as_ref()
            .ok_or_else(|| N1qlMiddlewareDbError::InterfaceError("Connection is closed".to_string()))
    }
}

/// Forwards statements to the connection and keeps the latest result.
#[derive(Debug)]
pub struct Cursor<'c> {
    connection: &'c Connection,
    result: Option<QueryResult>,
}

impl<'c> Cursor<'c> {
    #[must_use]
    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    /// Run `query` with positional `params`, replacing any earlier result.
    ///
    /// Parameter count is not checked against the statement; the query service
    /// rejects a mismatch itself.
    ///
    /// # Errors
    ///
    /// Returns the classified native error if the statement fails,
    /// `InterfaceError` if the connection has been closed, or `DataError` if a
    /// parameter has no JSON form (the statement is not sent).
    pub async fn execute(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<(), N1qlMiddlewareDbError> {
        self.execute_with_options(query, params, QueryOptions::default())
            .await
    }

    /// Same as [`Cursor::execute`], with per-call placeholder translation.
    ///
    /// # Errors
    ///
    /// See [`Cursor::execute`].
    pub async fn execute_with_options(
        &mut self,
        query: &str,
        params: &[RowValues],
        options: QueryOptions,
    ) -> Result<(), N1qlMiddlewareDbError> {
        self.result = None;
        let service = self.connection.service()?;

        let translate = options
            .translation
            .resolve(self.connection.translate_placeholders);
        let statement = translate_placeholders(query, options.style, translate);
        let request = N1qlQuery::new(statement.into_owned(), convert_params(params)?);

        tracing::debug!(statement = %request.statement, params = request.args.len(), "executing statement");
        let result = service.n1ql_query(&request).await.map_err(|e| {
            let err = N1qlMiddlewareDbError::from(e);
            tracing::debug!(error = %err, "statement failed");
            err
        })?;

        self.result = Some(result);
        Ok(())
    }

    /// The result of the last `execute`, as the query client returned it.
    ///
    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::InterfaceError` if nothing has been executed.
    pub fn fetch_all(&self) -> Result<&QueryResult, N1qlMiddlewareDbError> {
        self.result.as_ref().ok_or_else(|| {
            N1qlMiddlewareDbError::InterfaceError("fetch called before execute".to_string())
        })
    }

    /// The single row of the last result.
    ///
    /// # Errors
    ///
    /// Returns `InterfaceError` before any `execute`, and `DataError` when the
    /// result has zero rows or more than one.
    pub fn fetch_one(&self) -> Result<&JsonValue, N1qlMiddlewareDbError> {
        self.fetch_all()?.get_single_result()
    }
}
