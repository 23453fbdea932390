//! Async DB-API style adapter for the Couchbase N1QL query service.
//!
//! The crate maps the usual driver surface (settings, connection, cursor,
//! identifier quoting, table listing) onto the query service's HTTP API:
//!
//! ```rust,no_run
//! use n1ql_middleware::prelude::*;
//!
//! # async fn run() -> Result<(), N1qlMiddlewareDbError> {
//! let settings = Settings::new().with("NAME", "mybucket").with("HOST", "db1");
//! let mut db = DatabaseWrapper::new(settings);
//!
//! let mut cursor = db.create_cursor()?;
//! cursor
//!     .execute("SELECT * FROM mybucket WHERE id = $1", &[RowValues::Text("x".into())])
//!     .await?;
//! for row in cursor.fetch_all()? {
//!     println!("{row}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod introspection;
pub mod operations;
pub mod prelude;
pub mod shell;
pub mod translation;
pub mod types;
pub mod wrapper;

pub use client::{ClientError, N1qlQuery, QueryResult, QueryService};
pub use config::{ConnectionString, CouchbaseOptions, Settings, get_connection_params};
pub use connection::{Connection, Cursor};
pub use error::{ErrorKind, N1qlMiddlewareDbError};
pub use wrapper::DatabaseWrapper;
