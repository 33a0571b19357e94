use backends::BackendError;
use common::error::ErrorContext;
use common::utils::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("registration failed: {context}")]
    Registration { context: ErrorContext },
    #[error("file resolution failed: {context}")]
    Resolve {
        context: ErrorContext,
        #[source]
        source: ResolveError,
    },
}

impl EngineError {
    #[track_caller]
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            context: ErrorContext::new(message.into()),
        }
    }
}

impl From<ResolveError> for EngineError {
    #[track_caller]
    fn from(err: ResolveError) -> Self {
        EngineError::Resolve {
            context: ErrorContext::new(err.to_string()),
            source: err,
        }
    }
}
