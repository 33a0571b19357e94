use common::error::ErrorContext;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog inconsistency: {context}")]
    Inconsistent { context: ErrorContext },
    #[error("unsupported connector: {context}")]
    Unsupported { context: ErrorContext },
    #[error("missing connector option: {context}")]
    MissingOption { context: ErrorContext },
    #[error("serde json error: {context}")]
    Json {
        context: ErrorContext,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error: {context}")]
    Io {
        context: ErrorContext,
        #[source]
        source: io::Error,
    },
}

impl CatalogError {
    #[track_caller]
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn missing_option(connector: &str, option: &str) -> Self {
        Self::MissingOption {
            context: ErrorContext::new(format!(
                "connector '{connector}' is missing option '{option}'"
            )),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json {
            context: ErrorContext::new(err.to_string()),
            source: err,
        }
    }
}

impl From<io::Error> for CatalogError {
    #[track_caller]
    fn from(err: io::Error) -> Self {
        CatalogError::Io {
            context: ErrorContext::new(err.to_string()),
            source: err,
        }
    }
}
