//! Database driver contracts, closure-backed adapters and a `SQLite`
//! implementation.
//!
//! The traits mirror a classic driver stack: a [`Driver`] opens a [`Conn`],
//! which prepares [`Stmt`]s and begins [`Tx`]s; queries yield [`Rows`].

pub mod adapters;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use adapters::{ConnFunc, DriverFunc, RowsFunc, StmtFunc, TxFunc};
#[cfg(feature = "sqlite")]
pub use sqlite::sqlite_driver;

use crate::error::DriverError;

/// A bound argument or a column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Integer payload, with booleans as `0`/`1`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Text payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Row id of the most recent insert.
    pub last_insert_id: i64,
    /// Rows changed by the statement.
    pub rows_affected: u64,
}

/// Opens connections.
pub trait Driver: Send + Sync {
    /// Opens a connection to the data source `name`.
    fn open(&self, name: &str) -> Result<Box<dyn Conn>, DriverError>;
}

/// One database connection.
pub trait Conn: Send {
    /// Prepares `query` for execution.
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>, DriverError>;
    /// Closes the connection.
    fn close(&mut self) -> Result<(), DriverError>;
    /// Starts a transaction.
    fn begin(&mut self) -> Result<Box<dyn Tx>, DriverError>;
}

/// A prepared statement.
pub trait Stmt: Send {
    /// Releases the statement.
    fn close(&mut self) -> Result<(), DriverError>;
    /// Number of placeholders, or `None` when the driver cannot tell.
    fn num_input(&self) -> Option<usize>;
    /// Runs a statement that returns no rows.
    fn exec(&mut self, args: &[Value]) -> Result<ExecResult, DriverError>;
    /// Runs a statement that returns rows.
    fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>, DriverError>;
}

/// An open transaction. Ends with exactly one of `commit` or `rollback`.
pub trait Tx: Send {
    /// Commits.
    fn commit(&mut self) -> Result<(), DriverError>;
    /// Rolls back.
    fn rollback(&mut self) -> Result<(), DriverError>;
}

/// Result set cursor.
pub trait Rows: Send {
    /// Column names.
    fn columns(&self) -> Vec<String>;
    /// Next row, or `None` once exhausted.
    fn next(&mut self) -> Result<Option<Vec<Value>>, DriverError>;
    /// Releases the cursor.
    fn close(&mut self) -> Result<(), DriverError>;
}
