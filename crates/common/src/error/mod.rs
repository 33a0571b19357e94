pub mod diagnostics;

pub use diagnostics::ErrorContext;

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Top-level error funnel for the binary: everything that can stop a run,
/// split by the phase it failed in.
#[derive(Debug)]
pub enum RunnerError {
    Config(Box<dyn Error + Send + Sync>),
    Run(Box<dyn Error + Send + Sync>),
}

impl RunnerError {
    pub fn config(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Config(Box::new(err))
    }

    pub fn config_msg(message: impl Into<String>) -> Self {
        Self::Config(message.into().into())
    }

    pub fn run(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Run(Box::new(err))
    }
}

impl Display for RunnerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Config(e) => write!(f, "configuration failed: {e}"),
            RunnerError::Run(e) => write!(f, "run failed: {e}"),
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunnerError::Config(e) => Some(&**e),
            RunnerError::Run(e) => Some(&**e),
        }
    }
}
