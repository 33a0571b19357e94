pub mod bigquery;
pub mod clickhouse;
pub mod postgres;

use crate::process::ToolError;
use common::error::ErrorContext;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid connection details: {context}")]
    InvalidConnection { context: ErrorContext },
    #[error("syntax error: {context}")]
    Syntax { context: ErrorContext },
    #[error("configuration error: {context}")]
    Config { context: ErrorContext },
    #[error("unexpected error: {context}")]
    Unexpected { context: ErrorContext },
    #[error("I/O error: {context}")]
    Io {
        context: ErrorContext,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl AdapterError {
    #[track_caller]
    pub fn invalid_connection(message: impl Into<String>) -> Self {
        Self::InvalidConnection {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: ErrorContext::new(message.into()),
            source,
        }
    }
}

/// Synchronous facade over a live database connection.
///
/// Implementations own whatever runtime they need internally; callers stay
/// blocking, matching the single-threaded execution model of a run.
pub trait DatabaseAdapter {
    fn execute(&mut self, sql: &str) -> Result<(), AdapterError>;

    /// Drop the connection. Default is a no-op for connectionless adapters.
    fn close(&mut self) {}
}

impl std::fmt::Debug for dyn DatabaseAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseAdapter").finish_non_exhaustive()
    }
}

static DB_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^(?P<scheme>[A-Za-z][A-Za-z0-9+.:-]*)://
        (?:(?P<user>[^:@/]+)(?::(?P<password>[^@/]*))?@)?
        (?P<host>[^:/?@]+)
        (?::(?P<port>\d+))?
        (?:/(?P<database>[^?]*))?$",
    )
    .expect("database url grammar")
});

/// The pieces of a database connection URL this layer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbUrl {
    pub scheme: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub database: Option<String>,
}

impl DbUrl {
    pub fn parse(url: &str) -> Result<Self, AdapterError> {
        let caps = DB_URL.captures(url).ok_or_else(|| {
            AdapterError::invalid_connection(format!("cannot parse database url `{url}`"))
        })?;
        let port = caps
            .name("port")
            .map(|p| {
                p.as_str().parse::<u16>().map_err(|_| {
                    AdapterError::invalid_connection(format!("port out of range in `{url}`"))
                })
            })
            .transpose()?;
        Ok(Self {
            scheme: caps["scheme"].to_string(),
            username: caps.name("user").map(|m| m.as_str().to_string()),
            password: caps.name("password").map(|m| m.as_str().to_string()),
            host: caps["host"].to_string(),
            port,
            database: caps
                .name("database")
                .map(|m| m.as_str().to_string())
                .filter(|d| !d.is_empty()),
        })
    }

    /// Driver name: the last segment of a possibly compound scheme, so
    /// `jdbc:postgresql` routes the same way as `postgresql`.
    pub fn driver(&self) -> &str {
        self.scheme.rsplit(':').next().unwrap_or(&self.scheme)
    }
}

/// Open a connection for the given URL, selecting the adapter by scheme.
pub fn create_db_adapter(url: &str) -> Result<Box<dyn DatabaseAdapter>, AdapterError> {
    let parsed = DbUrl::parse(url)?;
    match parsed.driver() {
        "postgres" | "postgresql" => Ok(Box::new(postgres::PostgresAdapter::connect(&parsed)?)),
        "clickhouse" => Ok(Box::new(clickhouse::ClickhouseAdapter::connect(&parsed)?)),
        other => Err(AdapterError::config(format!(
            "no database adapter available for scheme '{other}'"
        ))),
    }
}
