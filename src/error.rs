use thiserror::Error;

use crate::client::ClientError;

/// Error type returned by every fallible operation in this crate.
///
/// The variants follow the usual DB-API vocabulary so callers written against a
/// relational driver can match on the same kinds, even though the store
/// underneath is a document database.
#[derive(Debug, Error)]
pub enum N1qlMiddlewareDbError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Interface error: {0}")]
    InterfaceError(String),

    #[error("Operational error: {0}")]
    OperationalError(String),

    #[error("Programming error: {0}")]
    ProgrammingError(String),

    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Not supported: {0}")]
    NotSupportedError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Coarse classification of an [`N1qlMiddlewareDbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Interface,
    Operational,
    Programming,
    Integrity,
    Data,
    Internal,
    NotSupported,
    Database,
}

impl N1qlMiddlewareDbError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) => ErrorKind::Configuration,
            Self::InterfaceError(_) => ErrorKind::Interface,
            Self::OperationalError(_) => ErrorKind::Operational,
            Self::ProgrammingError(_) => ErrorKind::Programming,
            Self::IntegrityError(_) => ErrorKind::Integrity,
            Self::DataError(_) => ErrorKind::Data,
            Self::InternalError(_) => ErrorKind::Internal,
            Self::NotSupportedError(_) => ErrorKind::NotSupported,
            Self::DatabaseError(_) => ErrorKind::Database,
        }
    }

    /// Classify a query service error code.
    ///
    /// Ranges follow the query service's published code layout: 1xxx request
    /// handling (1050-1065 malformed request fields, 1080 timeout), 3xxx parse,
    /// 4xxx plan, 5xxx execution, 12xxx/13xxx datastore, 17xxx transactions.
    #[must_use]
    pub fn from_service_code(code: u32, msg: &str) -> Self {
        let text = format!("[{code}] {msg}");
        match code {
            1050..=1065 => Self::ProgrammingError(text),
            1000..=1999 => Self::OperationalError(text),
            3000..=4999 => Self::ProgrammingError(text),
            5000 => Self::InternalError(text),
            5001..=5999 => Self::DataError(text),
            17012 => Self::IntegrityError(text),
            12009 if msg.to_ascii_lowercase().contains("duplicate key") => {
                Self::IntegrityError(text)
            }
            12000..=13999 => Self::OperationalError(text),
            17000..=17999 => Self::NotSupportedError(text),
            _ => Self::DatabaseError(text),
        }
    }
}

impl From<ClientError> for N1qlMiddlewareDbError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Service { code, msg } => Self::from_service_code(code, &msg),
            ClientError::Http(e) if e.is_decode() => {
                Self::InterfaceError(format!("Malformed query service response: {e}"))
            }
            ClientError::Http(e) => Self::OperationalError(format!("Query service request failed: {e}")),
            ClientError::Status { status, body } => {
                Self::OperationalError(format!("Query service returned {status}: {body}"))
            }
            ClientError::Decode(e) => {
                Self::InterfaceError(format!("Malformed query service response: {e}"))
            }
            ClientError::InvalidEndpoint(msg) => Self::ConfigError(msg),
            ClientError::Closed => {
                Self::InterfaceError("Query service client is closed".to_string())
            }
        }
    }
}
