//! Single-method io adapters: close, seek, positional read/write.

use crate::error::StreamError;
use crate::io::read::{ReadFunc, ReadOutcome};
use crate::io::write::{WriteFunc, WriteOutcome};
use std::io::{self, Read, SeekFrom, Write};

/// Releases a resource.
pub trait Closer {
    /// Closes the resource.
    fn close(&mut self) -> Result<(), StreamError>;
}

/// Reads at an absolute offset without moving any cursor.
pub trait ReaderAt {
    /// Fills `buf` starting at `offset`.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> ReadOutcome;
}

/// Writes at an absolute offset without moving any cursor.
pub trait WriterAt {
    /// Writes `buf` starting at `offset`.
    fn write_at(&mut self, buf: &[u8], offset: u64) -> WriteOutcome;
}

/// Closure-backed [`Closer`].
pub struct CloseFunc(Box<dyn FnMut() -> Result<(), StreamError> + Send>);

impl CloseFunc {
    /// Wraps a close function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut() -> Result<(), StreamError> + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// A closer that always succeeds.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| Ok(()))
    }
}

impl Closer for CloseFunc {
    fn close(&mut self) -> Result<(), StreamError> {
        (self.0)()
    }
}

/// Closure-backed [`std::io::Seek`].
pub struct SeekFunc(Box<dyn FnMut(SeekFrom) -> io::Result<u64> + Send>);

impl SeekFunc {
    /// Wraps a seek function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(SeekFrom) -> io::Result<u64> + Send + 'static,
    {
        Self(Box::new(f))
    }
}

impl io::Seek for SeekFunc {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (self.0)(pos)
    }
}

/// Closure-backed [`ReaderAt`].
pub struct ReadAtFunc(Box<dyn Fn(&mut [u8], u64) -> ReadOutcome + Send + Sync>);

impl ReadAtFunc {
    /// Wraps a positional read function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut [u8], u64) -> ReadOutcome + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    /// Serves positional reads from an in-memory byte slice.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::new(move |buf: &mut [u8], offset| {
            let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
            let n = (data.len() - start).min(buf.len());
            buf[..n].copy_from_slice(&data[start..start + n]);
            if start + n == data.len() {
                ReadOutcome::eof(n)
            } else {
                ReadOutcome::more(n)
            }
        })
    }
}

impl ReaderAt for ReadAtFunc {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> ReadOutcome {
        (self.0)(buf, offset)
    }
}

/// Closure-backed [`WriterAt`].
pub struct WriteAtFunc(Box<dyn FnMut(&[u8], u64) -> WriteOutcome + Send>);

impl WriteAtFunc {
    /// Wraps a positional write function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&[u8], u64) -> WriteOutcome + Send + 'static,
    {
        Self(Box::new(f))
    }
}

impl WriterAt for WriteAtFunc {
    fn write_at(&mut self, buf: &[u8], offset: u64) -> WriteOutcome {
        (self.0)(buf, offset)
    }
}

/// Bundles a reader, a writer and a closer into one value.
pub struct ReadWriteCloser {
    /// Read half.
    pub reader: ReadFunc,
    /// Write half.
    pub writer: WriteFunc,
    /// Close behaviour.
    pub closer: CloseFunc,
}

impl ReadWriteCloser {
    /// Creates the bundle.
    #[must_use]
    pub const fn new(reader: ReadFunc, writer: WriteFunc, closer: CloseFunc) -> Self {
        Self {
            reader,
            writer,
            closer,
        }
    }
}

impl io::Read for ReadWriteCloser {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl io::Write for ReadWriteCloser {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Closer for ReadWriteCloser {
    fn close(&mut self) -> Result<(), StreamError> {
        self.closer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Seek;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_close_func() {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&closed);
        let mut closer = CloseFunc::new(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        closer.close().unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_close_func_error() {
        let mut closer = CloseFunc::new(|| Err(StreamError::failed("already closed")));
        assert_eq!(
            closer.close().unwrap_err(),
            StreamError::failed("already closed")
        );
    }

    #[test]
    fn test_seek_func() {
        let mut pos = 0u64;
        let mut seeker = SeekFunc::new(move |from| {
            pos = match from {
                SeekFrom::Start(p) => p,
                SeekFrom::Current(d) => pos.saturating_add_signed(d),
                SeekFrom::End(_) => return Err(io::Error::other("no end")),
            };
            Ok(pos)
        });
        assert_eq!(seeker.seek(SeekFrom::Start(10)).unwrap(), 10);
        assert_eq!(seeker.seek(SeekFrom::Current(-4)).unwrap(), 6);
        assert!(seeker.seek(SeekFrom::End(0)).is_err());
    }

    #[test]
    fn test_read_at_from_bytes() {
        let reader = ReadAtFunc::from_bytes(b"0123456789".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(reader.read_at(&mut buf, 2), ReadOutcome::more(4));
        assert_eq!(&buf, b"2345");
        assert_eq!(reader.read_at(&mut buf, 8), ReadOutcome::eof(2));
        assert_eq!(&buf[..2], b"89");
        assert_eq!(reader.read_at(&mut buf, 50), ReadOutcome::eof(0));
    }

    #[test]
    fn test_write_at_func() {
        let store = Arc::new(Mutex::new(vec![b'.'; 8]));
        let target = Arc::clone(&store);
        let mut writer = WriteAtFunc::new(move |buf: &[u8], offset| {
            let start = usize::try_from(offset).unwrap();
            target.lock()[start..start + buf.len()].copy_from_slice(buf);
            WriteOutcome::ok(buf.len())
        });
        assert!(writer.write_at(b"ab", 3).is_complete(2));
        assert_eq!(store.lock().as_slice(), b"...ab...");
    }

    #[test]
    fn test_read_write_closer() {
        let out = Arc::new(Mutex::new(Vec::new()));
        let mut rwc = ReadWriteCloser::new(
            ReadFunc::from_reader(io::Cursor::new(b"in".to_vec())),
            WriteFunc::from_shared(Arc::clone(&out)),
            CloseFunc::noop(),
        );
        let mut input = String::new();
        rwc.read_to_string(&mut input).unwrap();
        rwc.write_all(b"out").unwrap();
        rwc.close().unwrap();
        assert_eq!(input, "in");
        assert_eq!(out.lock().as_slice(), b"out");
    }
}
