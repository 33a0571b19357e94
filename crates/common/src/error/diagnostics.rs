use std::{borrow::Cow, fmt, panic::Location};

/// Error message that remembers where it was built.
///
/// Every error enum in this workspace carries one of these as its `context`
/// payload. Constructors are marked `#[track_caller]` so the recorded
/// location is the place the error was raised, not this module.
#[derive(Clone, Debug)]
pub struct ErrorContext {
    message: Cow<'static, str>,
    location: &'static Location<'static>,
}

impl ErrorContext {
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// Build an [`ErrorContext`] with `format!` syntax while keeping the
/// caller's file/line.
#[macro_export]
macro_rules! ctx {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::ErrorContext::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::ErrorContext::new(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_call_site() {
        let context = ErrorContext::new("table missing");
        let rendered = context.to_string();
        assert!(rendered.starts_with("table missing (at "));
        assert!(rendered.contains("diagnostics.rs"));
    }

    #[test]
    fn macro_supports_formatting() {
        let context = ctx!("missing {} for {}", "url", "c1");
        assert_eq!(context.message(), "missing url for c1");
    }
}
