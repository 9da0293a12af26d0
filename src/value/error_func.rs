//! Error adapters.

use std::fmt;
use std::sync::Arc;

/// Closure-backed error whose message is produced on demand.
///
/// ```
/// use purefunc::value::ErrorFunc;
///
/// let err = ErrorFunc::new(|| "connection failed".to_string())
///     .wrap("database")
///     .with_code(500);
/// assert_eq!(err.to_string(), "[500] database: connection failed");
/// ```
#[derive(Clone)]
pub struct ErrorFunc {
    f: Arc<dyn Fn() -> String + Send + Sync>,
}

impl ErrorFunc {
    /// Wraps a message-producing function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// An error with a fixed message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move || message.clone())
    }

    /// The absence of an error.
    #[must_use]
    pub const fn empty() -> Option<Self> {
        None
    }

    /// Produces the message.
    #[must_use]
    pub fn message(&self) -> String {
        (self.f)()
    }

    /// Joins both messages with `"; "`.
    #[must_use]
    pub fn compose(self, other: Self) -> Self {
        Self::new(move || format!("{}; {}", self.message(), other.message()))
    }

    /// Prefixes the message with `context: `.
    #[must_use]
    pub fn wrap(self, context: &str) -> Self {
        let context = context.to_string();
        Self::new(move || format!("{context}: {}", self.message()))
    }

    /// Freezes the current message together with `code`.
    #[must_use]
    pub fn with_code(&self, code: i64) -> CodedError {
        CodedError {
            message: self.message(),
            code,
        }
    }
}

impl fmt::Display for ErrorFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl fmt::Debug for ErrorFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorFunc").field(&self.message()).finish()
    }
}

impl std::error::Error for ErrorFunc {}

/// Immutable error carrying a numeric code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct CodedError {
    message: String,
    code: i64,
}

impl CodedError {
    /// Creates a coded error.
    #[must_use]
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// The error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// The message without the code prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
