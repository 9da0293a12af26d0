//! Closure-backed byte sink.
//!
//! [`WriteFunc`] wraps `FnMut(&[u8]) -> WriteOutcome`. A count below the
//! input length with no error is a short write; the fan-out combinators
//! treat it as [`StreamError::ShortWrite`].

use crate::error::StreamError;
use crate::io::metrics::WriteMetrics;
use std::io;
use std::sync::Arc;
use std::time::Instant;

/// Byte count plus optional error returned by a byte sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Bytes accepted from the front of the buffer.
    pub n: usize,
    /// Failure, if any.
    pub error: Option<StreamError>,
}

impl WriteOutcome {
    /// `n` bytes accepted, no error.
    #[must_use]
    pub const fn ok(n: usize) -> Self {
        Self { n, error: None }
    }

    /// `n` bytes accepted, then a failure.
    #[must_use]
    pub const fn failed(n: usize, err: StreamError) -> Self {
        Self {
            n,
            error: Some(err),
        }
    }

    /// Returns `true` when there is no error and all `len` bytes were accepted.
    #[must_use]
    pub const fn is_complete(&self, len: usize) -> bool {
        self.error.is_none() && self.n == len
    }
}

type WriteFn = Box<dyn FnMut(&[u8]) -> WriteOutcome + Send>;

/// Closure-backed byte sink.
///
/// # Examples
///
/// ```
/// use purefunc::io::{WriteFunc, WriteOutcome};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let metrics = Arc::new(Mutex::new(Vec::new()));
///
/// let mut writer = WriteFunc::from_shared(Arc::clone(&log))
///     .tee(vec![WriteFunc::from_shared(Arc::clone(&metrics))]);
///
/// assert!(writer.write_chunk(b"event").is_complete(5));
/// assert_eq!(log.lock().as_slice(), b"event");
/// assert_eq!(metrics.lock().as_slice(), b"event");
/// ```
pub struct WriteFunc {
    f: WriteFn,
}

impl WriteFunc {
    /// Wraps a write function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&[u8]) -> WriteOutcome + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Adapts a [`std::io::Write`]; each chunk is one `write` call.
    pub fn from_writer<W>(mut writer: W) -> Self
    where
        W: io::Write + Send + 'static,
    {
        Self::new(move |buf: &[u8]| match writer.write(buf) {
            Ok(n) => WriteOutcome::ok(n),
            Err(e) => WriteOutcome::failed(0, e.into()),
        })
    }

    /// Appends every chunk to a shared, caller-owned buffer.
    pub fn from_shared(target: Arc<parking_lot::Mutex<Vec<u8>>>) -> Self {
        Self::new(move |buf: &[u8]| {
            target.lock().extend_from_slice(buf);
            WriteOutcome::ok(buf.len())
        })
    }

    /// Calls the wrapped function directly.
    pub fn write_chunk(&mut self, buf: &[u8]) -> WriteOutcome {
        (self.f)(buf)
    }

    /// Returns a sink that discards input and reports it fully written.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|buf: &[u8]| WriteOutcome::ok(buf.len()))
    }

    /// Writes to `self`, then to `other` only if `self` accepted everything.
    ///
    /// The reported outcome is `other`'s. This is not a broadcast; see [`Self::tee`].
    #[must_use]
    pub fn compose(mut self, mut other: Self) -> Self {
        Self::new(move |buf: &[u8]| {
            let first = self.write_chunk(buf);
            if first.error.is_some() {
                return first;
            }
            if first.n != buf.len() {
                return WriteOutcome::failed(first.n, StreamError::ShortWrite);
            }
            other.write_chunk(buf)
        })
    }

    /// Writes the same bytes to `self` and every sink in `others`, in order.
    ///
    /// Stops at the first sink that fails or underwrites.
    #[must_use]
    pub fn tee(self, others: Vec<Self>) -> Self {
        let mut all = Vec::with_capacity(others.len() + 1);
        all.push(self);
        all.extend(others);
        Self::new(move |buf: &[u8]| {
            for sink in &mut all {
                let outcome = sink.write_chunk(buf);
                if outcome.error.is_some() {
                    return outcome;
                }
                if outcome.n != buf.len() {
                    return WriteOutcome::failed(outcome.n, StreamError::ShortWrite);
                }
            }
            WriteOutcome::ok(buf.len())
        })
    }

    /// Transforms bytes before writing. Success reports the original length.
    #[must_use]
    pub fn map<T>(mut self, mut transform: T) -> Self
    where
        T: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        Self::new(move |buf: &[u8]| {
            let transformed = transform(buf);
            let outcome = self.write_chunk(&transformed);
            if outcome.error.is_some() {
                return outcome;
            }
            WriteOutcome::ok(buf.len())
        })
    }

    /// Writes only bytes matching `predicate`. Success reports the original length.
    #[must_use]
    pub fn filter<P>(mut self, mut predicate: P) -> Self
    where
        P: FnMut(u8) -> bool + Send + 'static,
    {
        Self::new(move |buf: &[u8]| {
            let filtered: Vec<u8> = buf.iter().copied().filter(|b| predicate(*b)).collect();
            let outcome = self.write_chunk(&filtered);
            if outcome.error.is_some() {
                return outcome;
            }
            WriteOutcome::ok(buf.len())
        })
    }

    /// Records every write into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<WriteMetrics>) -> Self {
        Self::new(move |buf: &[u8]| {
            let start = Instant::now();
            let outcome = self.write_chunk(buf);
            metrics.record(outcome.n, start.elapsed(), outcome.error.is_some());
            outcome
        })
    }
}

impl io::Write for WriteFunc {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let outcome = self.write_chunk(buf);
        match outcome.error {
            Some(err) => Err(err.into()),
            None => Ok(outcome.n.min(buf.len())),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for WriteFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteFunc").finish_non_exhaustive()
    }
}
