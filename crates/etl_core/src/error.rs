use common::error::ErrorContext;
use common::utils::ResolveError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported backend: {context}")]
    UnsupportedBackend { context: ErrorContext },
    #[error("malformed config override: {context}")]
    MalformedOverride { context: ErrorContext },
    #[error("invalid sql file: {context}")]
    InvalidSqlFile { context: ErrorContext },
    #[error("missing sql file: {context}")]
    MissingSqlFile { context: ErrorContext },
    #[error("shell command not available: {context}")]
    NotASubmitBackend { context: ErrorContext },
    #[error("file resolution failed: {context}")]
    Resolve {
        context: ErrorContext,
        #[source]
        source: ResolveError,
    },
    #[error("I/O error: {context}")]
    Io {
        context: ErrorContext,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn unsupported_backend(found: &str, supported: &[&str]) -> Self {
        Self::UnsupportedBackend {
            context: ErrorContext::new(format!(
                "unsupported backend `{found}`, all supported backends are: {supported:?}"
            )),
        }
    }

    #[track_caller]
    pub fn malformed_override(raw: &str) -> Self {
        Self::MalformedOverride {
            context: ErrorContext::new(format!(
                "config override `{raw}` must be of the form key=value"
            )),
        }
    }

    #[track_caller]
    pub fn invalid_sql_file(message: impl Into<String>) -> Self {
        Self::InvalidSqlFile {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn missing_sql_file(operation: &str) -> Self {
        Self::MissingSqlFile {
            context: ErrorContext::new(format!(
                "{operation} requires a configuration built from a sql file"
            )),
        }
    }

    #[track_caller]
    pub fn not_a_submit_backend(backend: impl std::fmt::Display) -> Self {
        Self::NotASubmitBackend {
            context: ErrorContext::new(format!(
                "shell command is only meaningful for spark and flink, not `{backend}`"
            )),
        }
    }
}

impl From<ResolveError> for ConfigError {
    #[track_caller]
    fn from(err: ResolveError) -> Self {
        ConfigError::Resolve {
            context: ErrorContext::new(err.to_string()),
            source: err,
        }
    }
}

impl From<io::Error> for ConfigError {
    #[track_caller]
    fn from(err: io::Error) -> Self {
        ConfigError::Io {
            context: ErrorContext::new(err.to_string()),
            source: err,
        }
    }
}
