//! Closure-backed filesystem adapters.

use crate::error::FsError;
use crate::fs::mode::FileMode;
use crate::fs::{DirEntry, File, FileInfo, FileSystem};
use crate::io::{CloseFunc, Closer, ReadFunc};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::SystemTime;

type OpenFn = dyn Fn(&str) -> Result<Box<dyn File>, FsError> + Send + Sync;

/// Closure-backed [`FileSystem`].
#[derive(Clone)]
pub struct FsFunc {
    f: Arc<OpenFn>,
}

impl FsFunc {
    /// Wraps an open function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Box<dyn File>, FsError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

impl FileSystem for FsFunc {
    fn open(&self, name: &str) -> Result<Box<dyn File>, FsError> {
        (self.f)(name)
    }
}

impl fmt::Debug for FsFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsFunc").finish_non_exhaustive()
    }
}

type StatFn = dyn Fn() -> Result<Box<dyn FileInfo>, FsError> + Send;

/// [`File`] assembled from a stat closure, a [`ReadFunc`] and a [`CloseFunc`].
///
/// Reads after [`close`](File::close) fail.
pub struct FileFunc {
    stat: Box<StatFn>,
    reader: ReadFunc,
    closer: CloseFunc,
    closed: bool,
}

impl FileFunc {
    /// Assembles a file.
    pub fn new<S>(stat: S, reader: ReadFunc, closer: CloseFunc) -> Self
    where
        S: Fn() -> Result<Box<dyn FileInfo>, FsError> + Send + 'static,
    {
        Self {
            stat: Box::new(stat),
            reader,
            closer,
            closed: false,
        }
    }

    /// An in-memory file named `name` holding `data`.
    #[must_use]
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Self {
        let info = FileInfoFunc::fixed(name, data.len() as u64, FileMode::file(0o444), None);
        Self::new(
            move || Ok(Box::new(info.clone()) as Box<dyn FileInfo>),
            ReadFunc::from_reader(io::Cursor::new(data)),
            CloseFunc::noop(),
        )
    }
}

impl io::Read for FileFunc {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::other(FsError::Closed));
        }
        self.reader.read(buf)
    }
}

impl File for FileFunc {
    fn stat(&self) -> Result<Box<dyn FileInfo>, FsError> {
        if self.closed {
            return Err(FsError::Closed);
        }
        (self.stat)()
    }

    fn close(&mut self) -> Result<(), FsError> {
        if self.closed {
            return Err(FsError::Closed);
        }
        self.closed = true;
        self.closer.close().map_err(|e| FsError::Io(e.to_string()))
    }
}

impl fmt::Debug for FileFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileFunc")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Closure-backed [`FileInfo`]. Each field is computed on demand.
#[derive(Clone)]
pub struct FileInfoFunc {
    /// Produces the base name.
    pub name: Arc<dyn Fn() -> String + Send + Sync>,
    /// Produces the size in bytes.
    pub size: Arc<dyn Fn() -> u64 + Send + Sync>,
    /// Produces the mode.
    pub mode: Arc<dyn Fn() -> FileMode + Send + Sync>,
    /// Produces the modification time.
    pub modified: Arc<dyn Fn() -> Option<SystemTime> + Send + Sync>,
}

impl FileInfoFunc {
    /// Info with fixed values.
    #[must_use]
    pub fn fixed(name: &str, size: u64, mode: FileMode, modified: Option<SystemTime>) -> Self {
        let name = name.to_string();
        Self {
            name: Arc::new(move || name.clone()),
            size: Arc::new(move || size),
            mode: Arc::new(move || mode),
            modified: Arc::new(move || modified),
        }
    }

    /// Snapshots on-disk metadata.
    #[must_use]
    pub fn from_metadata(name: &str, meta: &std::fs::Metadata) -> Self {
        Self::fixed(
            name,
            meta.len(),
            FileMode::from_metadata(meta),
            meta.modified().ok(),
        )
    }
}

impl FileInfo for FileInfoFunc {
    fn name(&self) -> String {
        (self.name)()
    }

    fn size(&self) -> u64 {
        (self.size)()
    }

    fn mode(&self) -> FileMode {
        (self.mode)()
    }

    fn modified(&self) -> Option<SystemTime> {
        (self.modified)()
    }

    fn is_dir(&self) -> bool {
        self.mode().is_dir()
    }
}

impl fmt::Debug for FileInfoFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileInfoFunc")
            .field("name", &self.name())
            .field("size", &self.size())
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

type InfoFn = dyn Fn() -> Result<Box<dyn FileInfo>, FsError> + Send + Sync;

/// Closure-backed [`DirEntry`].
pub struct DirEntryFunc {
    name: String,
    file_type: FileMode,
    info: Box<InfoFn>,
}

impl DirEntryFunc {
    /// An entry with a fixed name and type and a lazily computed info.
    pub fn new<I>(name: &str, file_type: FileMode, info: I) -> Self
    where
        I: Fn() -> Result<Box<dyn FileInfo>, FsError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            file_type: file_type.file_type(),
            info: Box::new(info),
        }
    }

    /// An entry whose info is `info` itself.
    #[must_use]
    pub fn from_info(info: FileInfoFunc) -> Self {
        let name = info.name();
        let mode = info.mode();
        Self::new(&name, mode, move || {
            Ok(Box::new(info.clone()) as Box<dyn FileInfo>)
        })
    }
}

impl DirEntry for DirEntryFunc {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    fn file_type(&self) -> FileMode {
        self.file_type
    }

    fn info(&self) -> Result<Box<dyn FileInfo>, FsError> {
        (self.info)()
    }
}

impl fmt::Debug for DirEntryFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirEntryFunc")
            .field("name", &self.name)
            .field("file_type", &self.file_type)
            .finish_non_exhaustive()
    }
}
