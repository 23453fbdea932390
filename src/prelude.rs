//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::client::{Bucket, ClientError, N1qlQuery, QueryMetrics, QueryResult, QueryService};
pub use crate::config::{
    ConnectionString, CouchbaseOptions, CouchbaseOptionsBuilder, Settings, get_connection_params,
};
pub use crate::connection::{Connection, Cursor};
pub use crate::error::{ErrorKind, N1qlMiddlewareDbError};
pub use crate::introspection::{DatabaseIntrospection, TABLE_LIST_QUERY, TableInfo};
pub use crate::operations::{DatabaseFeatures, DatabaseOperations};
pub use crate::shell::DatabaseClient;
pub use crate::translation::{
    PlaceholderStyle, QueryOptions, TranslationMode, translate_placeholders,
};
pub use crate::types::RowValues;
pub use crate::wrapper::{Connector, DatabaseWrapper};
