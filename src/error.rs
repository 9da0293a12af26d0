//! Error types for purefunc adapters.
//!
//! This module provides the error hierarchy using `thiserror` for every
//! adapter family: byte streams, HTTP handlers, contexts, filesystems,
//! database drivers and codecs.

use std::io;
use thiserror::Error;

/// Result type alias for purefunc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Byte-stream errors (readers and writers).
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// HTTP handler errors.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// Context cancellation errors.
    #[error("context error: {0}")]
    Context(#[from] ContextError),

    /// Filesystem errors.
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    /// Database driver errors.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Encoding and decoding errors.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Failures reported by byte sources and sinks.
///
/// End-of-stream is not an error; see [`crate::io::ReadStatus::Eof`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Failure reported by the wrapped function.
    #[error("{0}")]
    Failed(String),

    /// A sink accepted fewer bytes than offered without reporting an error.
    #[error("short write")]
    ShortWrite,

    /// The operation did not finish before its deadline.
    #[error("read timeout")]
    Timeout,

    /// Error surfaced from a `std::io` reader or writer.
    #[error("{message}")]
    Io {
        /// Original error kind.
        kind: io::ErrorKind,
        /// Original error message.
        message: String,
    },
}

impl StreamError {
    /// Creates a [`StreamError::Failed`] from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// HTTP handler errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Write attempted after the timeout middleware gave up on the handler.
    #[error("http: Handler timeout")]
    Timeout,

    /// Request could not be constructed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O failure while writing a response.
    #[error("response write failed: {0}")]
    Io(String),
}

/// Reasons a [`crate::context::Context`] is done.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Cancelled through its handle or a parent.
    #[error("context canceled")]
    Canceled,

    /// Deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Filesystem binding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Named file does not exist.
    #[error("open {name}: file does not exist")]
    NotExist {
        /// Requested name.
        name: String,
    },

    /// Name is not a valid relative path.
    #[error("open {name}: invalid argument")]
    Invalid {
        /// Requested name.
        name: String,
    },

    /// Operation on a closed file.
    #[error("file already closed")]
    Closed,

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Database driver errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Error reported by the database.
    #[error("database error: {0}")]
    Database(String),

    /// Wrong number of bound arguments.
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount {
        /// Parameters declared by the statement.
        expected: usize,
        /// Arguments supplied.
        got: usize,
    },

    /// Operation on a closed connection, statement or row set.
    #[error("{0} is closed")]
    Closed(&'static str),
}

/// Encoding and decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),

    /// Input rejected by an unmarshaler.
    #[error("invalid input: {0}")]
    Invalid(String),
}

// Implement From traits for standard library errors

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::WriteZero => Self::ShortWrite,
            kind => Self::Io {
                kind,
                message: err.to_string(),
            },
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::Failed(_) => io::ErrorKind::Other,
            StreamError::ShortWrite => io::ErrorKind::WriteZero,
            StreamError::Timeout => io::ErrorKind::TimedOut,
            StreamError::Io { kind, .. } => *kind,
        };
        Self::new(kind, err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Stream(StreamError::from(err))
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<io::Error> for HandlerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<http::Error> for HandlerError {
    fn from(err: http::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Driver(DriverError::from(err))
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(CodecError::from(err))
    }
}
