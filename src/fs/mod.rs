//! Read-only filesystem contracts and their closure-backed adapters.
//!
//! [`FsFunc`] opens files by name, [`FileFunc`] bundles read, stat and close
//! behaviour, and [`FileInfoFunc`]/[`DirEntryFunc`] describe entries. Names
//! are slash-separated and relative to the filesystem root.

pub mod adapters;
pub mod dir;
pub mod mode;

pub use adapters::{DirEntryFunc, FileFunc, FileInfoFunc, FsFunc};
pub use dir::{read_dir, read_file, valid_path};
pub use mode::FileMode;

use crate::error::FsError;
use std::io;
use std::time::SystemTime;

/// Describes one file.
pub trait FileInfo: Send + Sync {
    /// Base name.
    fn name(&self) -> String;
    /// Length in bytes.
    fn size(&self) -> u64;
    /// Mode bits.
    fn mode(&self) -> FileMode;
    /// Modification time, when known.
    fn modified(&self) -> Option<SystemTime>;
    /// Whether this describes a directory.
    fn is_dir(&self) -> bool;
}

/// An open file.
pub trait File: io::Read + Send {
    /// Describes the file.
    fn stat(&self) -> Result<Box<dyn FileInfo>, FsError>;
    /// Releases the file. A second call reports [`FsError::Closed`].
    fn close(&mut self) -> Result<(), FsError>;
}

/// One entry of a directory listing.
pub trait DirEntry: Send + Sync {
    /// Base name.
    fn name(&self) -> String;
    /// Whether the entry is a directory.
    fn is_dir(&self) -> bool;
    /// Type bits of the entry's mode.
    fn file_type(&self) -> FileMode;
    /// Full description of the entry.
    fn info(&self) -> Result<Box<dyn FileInfo>, FsError>;
}

/// Opens files by name.
pub trait FileSystem: Send + Sync {
    /// Opens `name` for reading.
    fn open(&self, name: &str) -> Result<Box<dyn File>, FsError>;
}
