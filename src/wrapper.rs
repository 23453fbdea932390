//! Caller-facing facade that assembles the adapters.
//!
//! The wrapper is a plain composition of capability structs (features,
//! operations, shell client, introspection) plus a connector function that
//! turns a connection string into a [`Connection`].

use std::fmt;
use std::sync::Arc;

use crate::config::{ConnectionString, CouchbaseOptions, Settings, get_connection_params};
use crate::connection::{Connection, Cursor};
use crate::error::N1qlMiddlewareDbError;
use crate::introspection::{DatabaseIntrospection, TableInfo};
use crate::operations::{DatabaseFeatures, DatabaseOperations};
use crate::shell::DatabaseClient;

/// Vendor name reported by [`DatabaseWrapper::vendor`].
pub const VENDOR: &str = "couchbase";

/// Builds a connection for a connection string.
pub type Connector = Arc<
    dyn Fn(&ConnectionString, &CouchbaseOptions) -> Result<Connection, N1qlMiddlewareDbError>
        + Send
        + Sync,
>;

pub struct DatabaseWrapper {
    settings: Settings,
    options: CouchbaseOptions,
    connector: Connector,
    connection: Option<Connection>,
    pub features: DatabaseFeatures,
    pub ops: DatabaseOperations,
    pub client: DatabaseClient,
    pub introspection: DatabaseIntrospection,
}

// Manual Debug implementation because the connector is a closure
impl fmt::Debug for DatabaseWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseWrapper")
            .field("settings", &self.settings)
            .field("options", &self.options)
            .field("connection", &self.connection)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl DatabaseWrapper {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            options: CouchbaseOptions::default(),
            connector: Arc::new(Connection::open),
            connection: None,
            features: DatabaseFeatures::default(),
            ops: DatabaseOperations,
            client: DatabaseClient::default(),
            introspection: DatabaseIntrospection,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CouchbaseOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace how connections are built, e.g. to point at an in-memory service.
    #[must_use]
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    #[must_use]
    pub fn vendor(&self) -> &'static str {
        VENDOR
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// # Errors
    ///
    /// Returns `N1qlMiddlewareDbError::ConfigError` naming the first missing
    /// required setting (`NAME`, then `HOST`).
    pub fn get_connection_params(&self) -> Result<ConnectionString, N1qlMiddlewareDbError> {
        get_connection_params(&self.settings)
    }

    /// # Errors
    ///
    /// Propagates whatever the connector reports.
    pub fn get_new_connection(
        &self,
        params: &ConnectionString,
    ) -> Result<Connection, N1qlMiddlewareDbError> {
        (self.connector)(params, &self.options)
    }

    /// Nothing to prepare on a fresh connection.
    pub fn init_connection_state(&mut self) {}

    /// Validate settings and open the connection. Settings are checked before
    /// any client is built. An already open connection is kept as is; call
    /// [`DatabaseWrapper::close`] first to reconnect.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for missing settings, or the connector's error.
    pub fn connect(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        if self.connection.is_some() {
            return Ok(());
        }
        let params = self.get_connection_params()?;
        let connection = self.get_new_connection(&params)?;
        self.connection = Some(connection);
        self.init_connection_state();
        tracing::debug!(vendor = VENDOR, connection = %params, "connected");
        Ok(())
    }

    /// Open the connection if it is not already open.
    ///
    /// # Errors
    ///
    /// See [`DatabaseWrapper::connect`].
    pub fn ensure_connection(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        self.connect()
    }

    #[must_use]
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// # Errors
    ///
    /// See [`DatabaseWrapper::connect`] and [`Connection::cursor`].
    pub fn create_cursor(&mut self) -> Result<Cursor<'_>, N1qlMiddlewareDbError> {
        self.ensure_connection()?;
        match &self.connection {
            Some(connection) => connection.cursor(),
            None => Err(N1qlMiddlewareDbError::InterfaceError(
                "No open connection".to_string(),
            )),
        }
    }

    /// Close and drop the current connection, if any.
    ///
    /// # Errors
    ///
    /// Propagates a classified error from the native client.
    pub async fn close(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await?;
        }
        Ok(())
    }

    /// Always true: no health check is performed.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        true
    }

    /// No-op; the backend has no transactions to toggle.
    pub fn set_autocommit(&mut self, autocommit: bool) {
        tracing::trace!(autocommit, "ignoring autocommit change");
    }

    /// # Errors
    ///
    /// Always returns `N1qlMiddlewareDbError::NotSupportedError`.
    pub fn start_transaction(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        Err(transactions_unsupported("start_transaction"))
    }

    /// # Errors
    ///
    /// Always returns `N1qlMiddlewareDbError::NotSupportedError`.
    pub fn commit(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        Err(transactions_unsupported("commit"))
    }

    /// # Errors
    ///
    /// Always returns `N1qlMiddlewareDbError::NotSupportedError`.
    pub fn rollback(&mut self) -> Result<(), N1qlMiddlewareDbError> {
        Err(transactions_unsupported("rollback"))
    }

    /// List index names and engines through a fresh cursor.
    ///
    /// # Errors
    ///
    /// See [`DatabaseIntrospection::get_table_list`].
    pub async fn table_list(&mut self) -> Result<Vec<TableInfo>, N1qlMiddlewareDbError> {
        let introspection = self.introspection;
        let mut cursor = self.create_cursor()?;
        introspection.get_table_list(&mut cursor).await
    }
}

fn transactions_unsupported(op: &str) -> N1qlMiddlewareDbError {
    N1qlMiddlewareDbError::NotSupportedError(format!(
        "{op}: {VENDOR} backend does not support transactions"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;

    #[test]
    fn missing_settings_fail_before_connecting() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = attempts.clone();
        let connector: Connector = Arc::new(move |cs: &ConnectionString, opts: &CouchbaseOptions| {
            *counter.lock().unwrap() += 1;
            Connection::open(cs, opts)
        });
        let mut db = DatabaseWrapper::new(Settings::new().with("HOST", "db1")).with_connector(connector);

        let err = db.connect().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("NAME"));
        assert_eq!(*attempts.lock().unwrap(), 0);
        assert!(db.connection().is_none());
    }

    #[tokio::test]
    async fn second_connect_keeps_open_connection() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = attempts.clone();
        let connector: Connector = Arc::new(move |cs: &ConnectionString, opts: &CouchbaseOptions| {
            *counter.lock().unwrap() += 1;
            Connection::open(cs, opts)
        });
        let mut db = DatabaseWrapper::new(Settings::new().with("NAME", "b").with("HOST", "db1"))
            .with_connector(connector);

        db.connect().unwrap();
        db.connect().unwrap();
        db.ensure_connection().unwrap();
        assert_eq!(*attempts.lock().unwrap(), 1);
        assert!(!db.connection().unwrap().is_closed());

        db.close().await.unwrap();
        assert!(db.connection().is_none());
        db.connect().unwrap();
        assert_eq!(*attempts.lock().unwrap(), 2);
    }

    #[test]
    fn transaction_calls_are_not_supported() {
        let mut db = DatabaseWrapper::new(Settings::new());
        assert!(!db.features.supports_transactions);
        assert_eq!(db.start_transaction().unwrap_err().kind(), ErrorKind::NotSupported);
        assert_eq!(db.commit().unwrap_err().kind(), ErrorKind::NotSupported);
        assert_eq!(db.rollback().unwrap_err().kind(), ErrorKind::NotSupported);
        db.set_autocommit(false);
        assert!(db.is_usable());
        assert_eq!(db.vendor(), "couchbase");
    }
}
