//! `SQLite` implementation of the driver contracts.
//!
//! One `rusqlite::Connection` is shared by the connection, its statements
//! and its transactions. Query results are buffered before they are
//! returned, so a [`Rows`](crate::driver::Rows) cursor never holds the lock.

// SQLite reports change counts as usize; they always fit in u64.
#![allow(clippy::cast_possible_truncation)]

use crate::driver::adapters::{ConnFunc, DriverFunc, RowsFunc, StmtFunc, TxFunc};
use crate::driver::{Conn, ExecResult, Rows, Stmt, Tx, Value};
use crate::error::DriverError;
use parking_lot::Mutex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use std::sync::Arc;

type Shared = Arc<Mutex<Option<Connection>>>;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as SqlValue;
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Self::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(t) => Self::Text(
                String::from_utf8(t.to_vec()).map_err(|e| FromSqlError::Other(Box::new(e)))?,
            ),
            ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        })
    }
}

fn with_conn<T>(
    shared: &Shared,
    f: impl FnOnce(&Connection) -> Result<T, DriverError>,
) -> Result<T, DriverError> {
    let guard = shared.lock();
    let conn = guard.as_ref().ok_or(DriverError::Closed("connection"))?;
    f(conn)
}

fn exec(shared: &Shared, sql: &str, args: &[Value]) -> Result<ExecResult, DriverError> {
    with_conn(shared, |conn| {
        let changed = conn.prepare(sql)?.execute(params_from_iter(args))?;
        Ok(ExecResult {
            last_insert_id: conn.last_insert_rowid(),
            rows_affected: changed as u64,
        })
    })
}

fn query(shared: &Shared, sql: &str, args: &[Value]) -> Result<Box<dyn Rows>, DriverError> {
    let (columns, buffered) = with_conn(shared, |conn| {
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = stmt.query(params_from_iter(args))?;
        let mut buffered = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            buffered.push(values);
        }
        Ok((columns, buffered))
    })?;
    tracing::trace!(rows = buffered.len(), "buffered query result");
    Ok(Box::new(RowsFunc::from_rows(columns, buffered)))
}

fn prepare(shared: &Shared, sql: &str) -> Result<Box<dyn Stmt>, DriverError> {
    let count = with_conn(shared, |conn| Ok(conn.prepare(sql)?.parameter_count()))?;
    let sql = sql.to_string();
    let (exec_conn, exec_sql) = (Arc::clone(shared), sql.clone());
    let query_conn = Arc::clone(shared);
    let stmt = StmtFunc::new(
        move |args: &[Value]| exec(&exec_conn, &exec_sql, args),
        move |args: &[Value]| query(&query_conn, &sql, args),
    )
    .with_num_input(count);
    Ok(Box::new(stmt))
}

fn begin(shared: &Shared) -> Result<Box<dyn Tx>, DriverError> {
    with_conn(shared, |conn| Ok(conn.execute_batch("BEGIN")?))?;
    let (commit_conn, rollback_conn) = (Arc::clone(shared), Arc::clone(shared));
    Ok(Box::new(TxFunc::new(
        move || with_conn(&commit_conn, |conn| Ok(conn.execute_batch("COMMIT")?)),
        move || with_conn(&rollback_conn, |conn| Ok(conn.execute_batch("ROLLBACK")?)),
    )))
}

fn close(shared: &Shared) -> Result<(), DriverError> {
    match shared.lock().take() {
        Some(conn) => conn.close().map_err(|(_, err)| DriverError::from(err)),
        None => Err(DriverError::Closed("connection")),
    }
}

fn open(name: &str) -> Result<Box<dyn Conn>, DriverError> {
    let conn = if name.is_empty() || name == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(name)?
    };
    tracing::debug!(name, "opened sqlite connection");
    let shared: Shared = Arc::new(Mutex::new(Some(conn)));
    let (prepare_conn, begin_conn) = (Arc::clone(&shared), Arc::clone(&shared));
    Ok(Box::new(
        ConnFunc::new(move |sql: &str| prepare(&prepare_conn, sql))
            .with_begin(move || begin(&begin_conn))
            .with_close(move || close(&shared)),
    ))
}

/// A [`DriverFunc`] backed by `SQLite`.
///
/// `open` accepts a file path, or `":memory:"` (or an empty name) for a
/// private in-memory database.
///
/// ```
/// use purefunc::driver::{Conn, Driver, Rows, Stmt, Value, sqlite_driver};
///
/// let mut conn = sqlite_driver().open(":memory:").unwrap();
/// let mut stmt = conn.prepare("SELECT ?1 + 1").unwrap();
/// assert_eq!(stmt.num_input(), Some(1));
/// let mut rows = stmt.query(&[Value::Integer(41)]).unwrap();
/// assert_eq!(rows.next().unwrap(), Some(vec![Value::Integer(42)]));
/// ```
#[must_use]
pub fn sqlite_driver() -> DriverFunc {
    DriverFunc::new(open)
}
