//! Closure-backed byte source.
//!
//! [`ReadFunc`] wraps `FnMut(&mut [u8]) -> ReadOutcome` and provides
//! composable read transforms. It implements [`std::io::Read`], so a
//! composed chain can be handed to anything expecting a reader.

use crate::error::StreamError;
use crossbeam::channel;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Completion status of a single read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    /// More data may follow.
    More,
    /// The source is exhausted. Bytes returned alongside are still valid.
    Eof,
    /// The read failed.
    Failed(StreamError),
}

impl ReadStatus {
    /// Returns `true` for [`ReadStatus::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns `true` for [`ReadStatus::Eof`].
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

/// Byte count plus status returned by a byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes written into the front of the buffer.
    pub n: usize,
    /// Completion status.
    pub status: ReadStatus,
}

impl ReadOutcome {
    /// `n` bytes, more to come.
    #[must_use]
    pub const fn more(n: usize) -> Self {
        Self {
            n,
            status: ReadStatus::More,
        }
    }

    /// `n` bytes, then end of stream.
    #[must_use]
    pub const fn eof(n: usize) -> Self {
        Self {
            n,
            status: ReadStatus::Eof,
        }
    }

    /// Zero bytes and a failure.
    #[must_use]
    pub const fn failed(err: StreamError) -> Self {
        Self {
            n: 0,
            status: ReadStatus::Failed(err),
        }
    }
}

type ReadFn = Box<dyn FnMut(&mut [u8]) -> ReadOutcome + Send>;

/// Closure-backed byte source.
///
/// # Examples
///
/// ```
/// use purefunc::io::{ReadFunc, ReadOutcome};
/// use std::io::Read;
///
/// let mut reader = ReadFunc::new(|buf: &mut [u8]| {
///     let data = b"hello world";
///     let n = data.len().min(buf.len());
///     buf[..n].copy_from_slice(&data[..n]);
///     ReadOutcome::eof(n)
/// })
/// .map(|chunk| chunk.to_ascii_uppercase());
///
/// let mut out = String::new();
/// reader.read_to_string(&mut out).unwrap();
/// assert_eq!(out, "HELLO WORLD");
/// ```
pub struct ReadFunc {
    f: ReadFn,
    finished: bool,
    pending: Option<StreamError>,
}

impl ReadFunc {
    /// Wraps a read function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&mut [u8]) -> ReadOutcome + Send + 'static,
    {
        Self {
            f: Box::new(f),
            finished: false,
            pending: None,
        }
    }

    /// Adapts a [`std::io::Read`]. `Ok(0)` on a non-empty buffer becomes `Eof`.
    pub fn from_reader<R>(mut reader: R) -> Self
    where
        R: io::Read + Send + 'static,
    {
        Self::new(move |buf: &mut [u8]| match reader.read(buf) {
            Ok(0) if !buf.is_empty() => ReadOutcome::eof(0),
            Ok(n) => ReadOutcome::more(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => ReadOutcome::more(0),
            Err(e) => ReadOutcome::failed(e.into()),
        })
    }

    /// Calls the wrapped function directly.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let mut outcome = (self.f)(buf);
        outcome.n = outcome.n.min(buf.len());
        outcome
    }

    /// Returns a source that always reports end of stream with zero bytes.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|_: &mut [u8]| ReadOutcome::eof(0))
    }

    /// Reads from `self` until it reports end of stream, then from `next`.
    #[must_use]
    pub fn compose(mut self, mut next: Self) -> Self {
        let mut exhausted = false;
        Self::new(move |buf: &mut [u8]| {
            if exhausted {
                return next.read_chunk(buf);
            }
            let outcome = self.read_chunk(buf);
            if !outcome.status.is_eof() {
                return outcome;
            }
            exhausted = true;
            if outcome.n > 0 {
                ReadOutcome::more(outcome.n)
            } else {
                next.read_chunk(buf)
            }
        })
    }

    /// Transforms the bytes produced by each read in place.
    ///
    /// At most `min(output.len(), n)` bytes are copied back; the count is
    /// unchanged. Transforms should preserve length.
    #[must_use]
    pub fn map<T>(mut self, mut transform: T) -> Self
    where
        T: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        Self::new(move |buf: &mut [u8]| {
            let outcome = self.read_chunk(buf);
            if outcome.n > 0 && !outcome.status.is_failed() {
                let transformed = transform(&buf[..outcome.n]);
                let len = transformed.len().min(outcome.n);
                buf[..len].copy_from_slice(&transformed[..len]);
            }
            outcome
        })
    }

    /// Keeps only bytes matching `predicate`, compacting in place.
    #[must_use]
    pub fn filter<P>(mut self, mut predicate: P) -> Self
    where
        P: FnMut(u8) -> bool + Send + 'static,
    {
        Self::new(move |buf: &mut [u8]| {
            let mut outcome = self.read_chunk(buf);
            if outcome.n > 0 && !outcome.status.is_failed() {
                let mut kept = 0;
                for i in 0..outcome.n {
                    let b = buf[i];
                    if predicate(b) {
                        buf[kept] = b;
                        kept += 1;
                    }
                }
                outcome.n = kept;
            }
            outcome
        })
    }

    /// Limits the total number of bytes returned to `limit`.
    #[must_use]
    pub fn take(mut self, limit: i64) -> Self {
        let mut remaining = limit;
        Self::new(move |buf: &mut [u8]| {
            if remaining <= 0 {
                tracing::trace!(limit, "take budget exhausted");
                return ReadOutcome::eof(0);
            }
            let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
            let outcome = self.read_chunk(&mut buf[..len]);
            remaining -= i64::try_from(outcome.n).unwrap_or(i64::MAX);
            outcome
        })
    }

    /// Re-invokes the source up to `max_retries` extra times on failure.
    ///
    /// End of stream counts as success. There is no delay between attempts.
    #[must_use]
    pub fn retry(mut self, max_retries: usize) -> Self {
        Self::new(move |buf: &mut [u8]| {
            let mut last = StreamError::failed("retry: no attempts made");
            for attempt in 0..=max_retries {
                let outcome = self.read_chunk(buf);
                if !outcome.status.is_failed() {
                    return outcome;
                }
                if let ReadStatus::Failed(err) = outcome.status {
                    tracing::debug!(attempt, max_retries, error = %err, "read attempt failed");
                    last = err;
                }
            }
            ReadOutcome::failed(last)
        })
    }

    /// Fails a read with [`StreamError::Timeout`] if it takes longer than `timeout`.
    ///
    /// The wrapped source runs on its own thread against a scratch buffer,
    /// so an abandoned read never touches the caller's buffer. Its result is
    /// discarded; the next read waits for it to release the source.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let shared = Arc::new(Mutex::new(self));
        Self::new(move |buf: &mut [u8]| {
            let (tx, rx) = channel::bounded(1);
            let source = Arc::clone(&shared);
            let len = buf.len();
            thread::spawn(move || {
                let mut scratch = vec![0u8; len];
                let outcome = source.lock().read_chunk(&mut scratch);
                let _ = tx.send((scratch, outcome));
            });

            match rx.recv_timeout(timeout) {
                Ok((scratch, outcome)) => {
                    buf[..outcome.n].copy_from_slice(&scratch[..outcome.n]);
                    outcome
                }
                Err(channel::RecvTimeoutError::Timeout) => {
                    tracing::warn!(?timeout, "read timed out");
                    ReadOutcome::failed(StreamError::Timeout)
                }
                Err(channel::RecvTimeoutError::Disconnected) => {
                    ReadOutcome::failed(StreamError::failed("read panicked"))
                }
            }
        })
    }

    /// Observes every read: the produced bytes, their count, and the status.
    #[must_use]
    pub fn tap<O>(mut self, mut observer: O) -> Self
    where
        O: FnMut(&[u8], usize, &ReadStatus) + Send + 'static,
    {
        Self::new(move |buf: &mut [u8]| {
            let outcome = self.read_chunk(buf);
            observer(&buf[..outcome.n], outcome.n, &outcome.status);
            outcome
        })
    }
}

impl io::Read for ReadFunc {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.pending.take() {
            return Err(err.into());
        }
        if self.finished || buf.is_empty() {
            return Ok(0);
        }
        let outcome = self.read_chunk(buf);
        match outcome.status {
            // `Ok(0)` would read as end of stream; ask the caller to retry.
            ReadStatus::More if outcome.n == 0 => Err(io::ErrorKind::Interrupted.into()),
            ReadStatus::More => Ok(outcome.n),
            ReadStatus::Eof => {
                self.finished = true;
                Ok(outcome.n)
            }
            ReadStatus::Failed(err) if outcome.n > 0 => {
                self.pending = Some(err);
                Ok(outcome.n)
            }
            ReadStatus::Failed(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for ReadFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadFunc")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
