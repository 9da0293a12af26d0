//! Closure-backed driver adapters.
//!
//! Every adapter tracks whether it has been closed (or, for transactions,
//! finished) and reports [`DriverError::Closed`] afterwards.

use crate::driver::{Conn, Driver, ExecResult, Rows, Stmt, Tx, Value};
use crate::error::DriverError;
use std::fmt;
use std::sync::Arc;

type OpenFn = dyn Fn(&str) -> Result<Box<dyn Conn>, DriverError> + Send + Sync;

/// Closure-backed [`Driver`].
#[derive(Clone)]
pub struct DriverFunc {
    f: Arc<OpenFn>,
}

impl DriverFunc {
    /// Wraps an open function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Box<dyn Conn>, DriverError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

impl Driver for DriverFunc {
    fn open(&self, name: &str) -> Result<Box<dyn Conn>, DriverError> {
        (self.f)(name)
    }
}

impl fmt::Debug for DriverFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverFunc").finish_non_exhaustive()
    }
}

type PrepareFn = dyn FnMut(&str) -> Result<Box<dyn Stmt>, DriverError> + Send;
type BeginFn = dyn FnMut() -> Result<Box<dyn Tx>, DriverError> + Send;
type CloseFn = dyn FnMut() -> Result<(), DriverError> + Send;

fn noop_close() -> Box<CloseFn> {
    Box::new(|| Ok(()))
}

/// Closure-backed [`Conn`].
pub struct ConnFunc {
    prepare: Box<PrepareFn>,
    begin: Box<BeginFn>,
    close: Box<CloseFn>,
    closed: bool,
}

impl ConnFunc {
    /// A connection that prepares with `prepare`, closes as a no-op and
    /// refuses transactions until [`with_begin`](Self::with_begin) is set.
    pub fn new<P>(prepare: P) -> Self
    where
        P: FnMut(&str) -> Result<Box<dyn Stmt>, DriverError> + Send + 'static,
    {
        Self {
            prepare: Box::new(prepare),
            begin: Box::new(|| {
                Err(DriverError::Database(
                    "transactions are not supported".to_string(),
                ))
            }),
            close: noop_close(),
            closed: false,
        }
    }

    /// Sets the transaction starter.
    #[must_use]
    pub fn with_begin<B>(mut self, begin: B) -> Self
    where
        B: FnMut() -> Result<Box<dyn Tx>, DriverError> + Send + 'static,
    {
        self.begin = Box::new(begin);
        self
    }

    /// Sets the close behaviour.
    #[must_use]
    pub fn with_close<C>(mut self, close: C) -> Self
    where
        C: FnMut() -> Result<(), DriverError> + Send + 'static,
    {
        self.close = Box::new(close);
        self
    }

    const fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            Err(DriverError::Closed("connection"))
        } else {
            Ok(())
        }
    }
}

impl Conn for ConnFunc {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>, DriverError> {
        self.ensure_open()?;
        (self.prepare)(query)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.closed = true;
        (self.close)()
    }

    fn begin(&mut self) -> Result<Box<dyn Tx>, DriverError> {
        self.ensure_open()?;
        (self.begin)()
    }
}

impl fmt::Debug for ConnFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnFunc")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

type ExecFn = dyn FnMut(&[Value]) -> Result<ExecResult, DriverError> + Send;
type QueryFn = dyn FnMut(&[Value]) -> Result<Box<dyn Rows>, DriverError> + Send;

/// Closure-backed [`Stmt`].
///
/// When the placeholder count is known, `exec` and `query` reject argument
/// lists of any other length before calling the closures.
pub struct StmtFunc {
    exec: Box<ExecFn>,
    query: Box<QueryFn>,
    close: Box<CloseFn>,
    num_input: Option<usize>,
    closed: bool,
}

impl StmtFunc {
    /// A statement with unknown placeholder count and no-op close.
    pub fn new<E, Q>(exec: E, query: Q) -> Self
    where
        E: FnMut(&[Value]) -> Result<ExecResult, DriverError> + Send + 'static,
        Q: FnMut(&[Value]) -> Result<Box<dyn Rows>, DriverError> + Send + 'static,
    {
        Self {
            exec: Box::new(exec),
            query: Box::new(query),
            close: noop_close(),
            num_input: None,
            closed: false,
        }
    }

    /// Declares the placeholder count.
    #[must_use]
    pub const fn with_num_input(mut self, n: usize) -> Self {
        self.num_input = Some(n);
        self
    }

    /// Sets the close behaviour.
    #[must_use]
    pub fn with_close<C>(mut self, close: C) -> Self
    where
        C: FnMut() -> Result<(), DriverError> + Send + 'static,
    {
        self.close = Box::new(close);
        self
    }

    fn check(&self, args: &[Value]) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed("statement"));
        }
        match self.num_input {
            Some(expected) if expected != args.len() => Err(DriverError::ArgumentCount {
                expected,
                got: args.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl Stmt for StmtFunc {
    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed("statement"));
        }
        self.closed = true;
        (self.close)()
    }

    fn num_input(&self) -> Option<usize> {
        self.num_input
    }

    fn exec(&mut self, args: &[Value]) -> Result<ExecResult, DriverError> {
        self.check(args)?;
        (self.exec)(args)
    }

    fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>, DriverError> {
        self.check(args)?;
        (self.query)(args)
    }
}

impl fmt::Debug for StmtFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StmtFunc")
            .field("num_input", &self.num_input)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Closure-backed [`Tx`]. Only the first `commit` or `rollback` runs.
pub struct TxFunc {
    commit: Box<CloseFn>,
    rollback: Box<CloseFn>,
    done: bool,
}

impl TxFunc {
    /// Wraps commit and rollback functions.
    pub fn new<C, R>(commit: C, rollback: R) -> Self
    where
        C: FnMut() -> Result<(), DriverError> + Send + 'static,
        R: FnMut() -> Result<(), DriverError> + Send + 'static,
    {
        Self {
            commit: Box::new(commit),
            rollback: Box::new(rollback),
            done: false,
        }
    }

    fn finish(&mut self) -> Result<(), DriverError> {
        if self.done {
            return Err(DriverError::Closed("transaction"));
        }
        self.done = true;
        Ok(())
    }
}

impl Tx for TxFunc {
    fn commit(&mut self) -> Result<(), DriverError> {
        self.finish()?;
        (self.commit)()
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.finish()?;
        (self.rollback)()
    }
}

impl fmt::Debug for TxFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxFunc")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

type NextFn = dyn FnMut() -> Result<Option<Vec<Value>>, DriverError> + Send;

/// Closure-backed [`Rows`].
pub struct RowsFunc {
    columns: Vec<String>,
    next: Box<NextFn>,
    closed: bool,
}

impl RowsFunc {
    /// Rows named `columns`, produced by `next` until it returns `None`.
    pub fn new<N>(columns: Vec<String>, next: N) -> Self
    where
        N: FnMut() -> Result<Option<Vec<Value>>, DriverError> + Send + 'static,
    {
        Self {
            columns,
            next: Box::new(next),
            closed: false,
        }
    }

    /// Replays buffered rows in order.
    #[must_use]
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut rows = rows.into_iter();
        Self::new(columns, move || Ok(rows.next()))
    }

    /// Drains the remaining rows.
    pub fn collect_all(&mut self) -> Result<Vec<Vec<Value>>, DriverError> {
        let mut out = Vec::new();
        while let Some(row) = Rows::next(self)? {
            out.push(row);
        }
        Ok(out)
    }
}

impl Rows for RowsFunc {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn next(&mut self) -> Result<Option<Vec<Value>>, DriverError> {
        if self.closed {
            return Err(DriverError::Closed("rows"));
        }
        (self.next)()
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed("rows"));
        }
        self.closed = true;
        Ok(())
    }
}

impl fmt::Debug for RowsFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowsFunc")
            .field("columns", &self.columns)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
