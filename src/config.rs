use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::N1qlMiddlewareDbError;

/// Scheme written into every connection string this crate produces.
pub const DEFAULT_SCHEME: &str = "couchbase";

/// Default port of the N1QL query service.
pub const DEFAULT_QUERY_PORT: u16 = 8093;

/// String-keyed database settings, e.g. `{"NAME": "mybucket", "HOST": "db1"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a key, treating an empty value as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parsed `<scheme>://<host>/<bucket>` connection string.
///
/// Port, credentials and query options are never encoded here; client-side
/// knobs live in [`CouchbaseOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub scheme: String,
    pub host: String,
    pub bucket: String,
}

impl ConnectionString {
    #[must_use]
    pub fn new(host: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: host.into(),
            bucket: bucket.into(),
        }
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.host, self.bucket)
    }
}

impl FromStr for ConnectionString {
    type Err = N1qlMiddlewareDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            N1qlMiddlewareDbError::ConfigError(format!(
                "Malformed connection string '{s}', expected <scheme>://<host>/<bucket>"
            ))
        };
        let (scheme, rest) = s.split_once("://").ok_or_else(malformed)?;
        let (host, bucket) = rest.split_once('/').ok_or_else(malformed)?;
        if scheme.is_empty() || host.is_empty() || bucket.is_empty() || bucket.contains('/') {
            return Err(malformed());
        }
        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            bucket: bucket.to_string(),
        })
    }
}

/// Build the connection string from settings.
///
/// # Errors
///
/// Returns `N1qlMiddlewareDbError::ConfigError` naming the first missing key
/// (`NAME` is checked before `HOST`).
pub fn get_connection_params(settings: &Settings) -> Result<ConnectionString, N1qlMiddlewareDbError> {
    let name = require(settings, "NAME")?;
    let host = require(settings, "HOST")?;
    Ok(ConnectionString::new(host, name))
}

fn require<'a>(settings: &'a Settings, key: &str) -> Result<&'a str, N1qlMiddlewareDbError> {
    settings.get(key).ok_or_else(|| {
        N1qlMiddlewareDbError::ConfigError(format!(
            "settings.DATABASES is improperly configured. Please supply the {key} value."
        ))
    })
}

/// Client-side options for reaching the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchbaseOptions {
    pub query_port: u16,
    pub http_scheme: String,
    pub timeout: Option<Duration>,
    pub translate_placeholders: bool,
}

impl Default for CouchbaseOptions {
    fn default() -> Self {
        Self {
            query_port: DEFAULT_QUERY_PORT,
            http_scheme: "http".to_string(),
            timeout: None,
            translate_placeholders: false,
        }
    }
}

impl CouchbaseOptions {
    #[must_use]
    pub fn builder() -> CouchbaseOptionsBuilder {
        CouchbaseOptionsBuilder::default()
    }
}

/// Fluent builder for [`CouchbaseOptions`].
#[derive(Debug, Clone, Default)]
pub struct CouchbaseOptionsBuilder {
    opts: CouchbaseOptions,
}

impl CouchbaseOptionsBuilder {
    #[must_use]
    pub fn query_port(mut self, port: u16) -> Self {
        self.opts.query_port = port;
        self
    }

    #[must_use]
    pub fn http_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.opts.http_scheme = scheme.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.opts.timeout = timeout;
        self
    }

    #[must_use]
    pub fn translation(mut self, translate_placeholders: bool) -> Self {
        self.opts.translate_placeholders = translate_placeholders;
        self
    }

    #[must_use]
    pub fn finish(self) -> CouchbaseOptions {
        self.opts
    }
}
