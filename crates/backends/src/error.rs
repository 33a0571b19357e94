use crate::adapters::AdapterError;
use crate::process::ToolError;
use catalog::CatalogError;
use common::error::ErrorContext;
use common::utils::ResolveError;
use etl_core::ConfigError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connection failed: {context}")]
    FailedToConnect { context: ErrorContext },
    #[error("execution failed: {context}")]
    FailedToExecute { context: ErrorContext },
    #[error("configuration error: {context}")]
    Config { context: ErrorContext },
    #[error("missing environment variable: {context}")]
    MissingEnvVar { context: ErrorContext },
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("I/O error: {context}")]
    Io {
        context: ErrorContext,
        #[source]
        source: io::Error,
    },
}

impl BackendError {
    #[track_caller]
    pub fn failed_to_connect(message: impl Into<String>) -> Self {
        Self::FailedToConnect {
            context: ErrorContext::new(message.into()),
        }
    }

    #[track_caller]
    pub fn failed_to_execute(message: impl Into<String>) -> Self {
        Self::FailedToExecute {
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
    pub fn missing_env_var(var: &str, backend: &str) -> Self {
        Self::MissingEnvVar {
            context: ErrorContext::new(format!(
                "must set {var} env var to run an ETL with the {backend} backend"
            )),
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

impl From<ConfigError> for BackendError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        BackendError::config(err.to_string())
    }
}

impl From<ResolveError> for BackendError {
    #[track_caller]
    fn from(err: ResolveError) -> Self {
        BackendError::config(err.to_string())
    }
}
