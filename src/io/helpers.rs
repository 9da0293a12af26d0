//! Free functions over arbitrary `std::io` readers and writers.

use crate::error::StreamError;
use crate::io::metrics::WriteMetrics;
use crate::io::read::{ReadFunc, ReadOutcome};
use crate::io::write::{WriteFunc, WriteOutcome};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Boxed reader accepted by [`compose_readers`].
pub type BoxReader = Box<dyn Read + Send>;

/// Boxed writer accepted by [`tee_writer`].
pub type BoxWriter = Box<dyn Write + Send>;

/// Concatenates readers: each one is drained before moving to the next.
///
/// # Examples
///
/// ```
/// use purefunc::io::{BoxReader, compose_readers};
/// use std::io::{Cursor, Read};
///
/// let parts: Vec<BoxReader> = vec![
///     Box::new(Cursor::new(b"foo".to_vec())),
///     Box::new(Cursor::new(b"bar".to_vec())),
/// ];
/// let mut joined = String::new();
/// compose_readers(parts).read_to_string(&mut joined).unwrap();
/// assert_eq!(joined, "foobar");
/// ```
pub fn compose_readers(mut readers: Vec<BoxReader>) -> ReadFunc {
    let mut idx = 0;
    ReadFunc::new(move |buf: &mut [u8]| {
        while idx < readers.len() {
            match readers[idx].read(buf) {
                Ok(0) if !buf.is_empty() => idx += 1,
                Ok(n) => return ReadOutcome::more(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return ReadOutcome::failed(e.into()),
            }
        }
        ReadOutcome::eof(0)
    })
}

/// Writes every chunk to all `writers` in order, failing fast.
pub fn tee_writer(mut writers: Vec<BoxWriter>) -> WriteFunc {
    WriteFunc::new(move |buf: &[u8]| {
        for writer in &mut writers {
            match writer.write(buf) {
                Ok(n) if n == buf.len() => {}
                Ok(n) => return WriteOutcome::failed(n, StreamError::ShortWrite),
                Err(e) => return WriteOutcome::failed(0, e.into()),
            }
        }
        WriteOutcome::ok(buf.len())
    })
}

/// Transforms each chunk before handing it to `writer`.
///
/// Success reports the original chunk length.
pub fn filter_writer<W, F>(writer: W, filter: F) -> WriteFunc
where
    W: Write + Send + 'static,
    F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
{
    WriteFunc::from_writer(writer).map(filter)
}

/// Transforms each chunk read from `reader`, copying the result back in place.
pub fn filter_reader<R, F>(reader: R, filter: F) -> ReadFunc
where
    R: Read + Send + 'static,
    F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
{
    ReadFunc::from_reader(reader).map(filter)
}

/// Meters every write made through `writer`.
pub fn with_metrics<W>(writer: W, metrics: Arc<WriteMetrics>) -> WriteFunc
where
    W: Write + Send + 'static,
{
    WriteFunc::from_writer(writer).with_metrics(metrics)
}
