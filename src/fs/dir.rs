//! On-disk and in-memory filesystems plus whole-file helpers.

use crate::error::FsError;
use crate::fs::adapters::{DirEntryFunc, FileFunc, FileInfoFunc, FsFunc};
use crate::fs::{DirEntry, File, FileInfo, FileSystem};
use crate::io::{CloseFunc, ReadFunc};
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Whether `name` is a slash-separated relative path without `.`, `..` or
/// empty elements. The root itself is `"."`.
#[must_use]
pub fn valid_path(name: &str) -> bool {
    if name == "." {
        return true;
    }
    !name.is_empty()
        && name
            .split('/')
            .all(|elem| !elem.is_empty() && elem != "." && elem != ".." && !elem.contains('\\'))
}

/// Opens `name`, reads it to the end and closes it.
///
/// The read error wins over the close error when both occur.
pub fn read_file(fs: &dyn FileSystem, name: &str) -> Result<Vec<u8>, FsError> {
    let mut file = fs.open(name)?;
    let mut data = Vec::new();
    let read = file.read_to_end(&mut data);
    let closed = file.close();
    read?;
    closed?;
    Ok(data)
}

/// Lists the directory at `path`, sorted by name.
pub fn read_dir(path: impl AsRef<Path>) -> Result<Vec<DirEntryFunc>, FsError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = entry.metadata()?;
        let info = FileInfoFunc::from_metadata(&name, &meta);
        entries.push(DirEntryFunc::from_info(info));
    }
    entries.sort_by_key(DirEntry::name);
    Ok(entries)
}

fn not_exist(name: &str) -> FsError {
    FsError::NotExist {
        name: name.to_string(),
    }
}

fn invalid(name: &str) -> FsError {
    FsError::Invalid {
        name: name.to_string(),
    }
}

fn open_on_disk(root: &Path, name: &str) -> Result<Box<dyn File>, FsError> {
    if !valid_path(name) {
        tracing::debug!(name, "rejected file name");
        return Err(invalid(name));
    }
    let path: PathBuf = root.join(name);
    let file = std::fs::File::open(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => not_exist(name),
        _ => FsError::from(e),
    })?;
    let base = Path::new(name)
        .file_name()
        .map_or_else(|| name.to_string(), |b| b.to_string_lossy().into_owned());

    Ok(Box::new(FileFunc::new(
        move || {
            let meta = std::fs::metadata(&path)?;
            Ok(Box::new(FileInfoFunc::from_metadata(&base, &meta)) as Box<dyn FileInfo>)
        },
        ReadFunc::from_reader(file),
        CloseFunc::noop(),
    )))
}

impl FsFunc {
    /// Serves files below `root`.
    ///
    /// Names must satisfy [`valid_path`]; others fail with
    /// [`FsError::Invalid`].
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::new(move |name: &str| open_on_disk(&root, name))
    }

    /// Serves the given in-memory files by exact name.
    #[must_use]
    pub fn from_files(files: BTreeMap<String, Vec<u8>>) -> Self {
        Self::new(move |name: &str| {
            if !valid_path(name) {
                return Err(invalid(name));
            }
            let data = files.get(name).ok_or_else(|| not_exist(name))?;
            let base = name.rsplit('/').next().unwrap_or(name);
            Ok(Box::new(FileFunc::from_bytes(base, data.clone())) as Box<dyn File>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mode::FileMode;
    use tempfile::TempDir;
    use test_case::test_case;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/inner.txt"), b"inner").unwrap();
        dir
    }

    #[test_case("hello.txt", true ; "plain")]
    #[test_case("a/b/c", true ; "nested")]
    #[test_case(".", true ; "root")]
    #[test_case("", false ; "empty")]
    #[test_case("/etc/passwd", false ; "absolute")]
    #[test_case("../secret", false ; "parent")]
    #[test_case("a/../b", false ; "inner parent")]
    #[test_case("a//b", false ; "empty element")]
    #[test_case("a/", false ; "trailing slash")]
    #[test_case("./a", false ; "dot element")]
    fn test_valid_path(name: &str, expected: bool) {
        assert_eq!(valid_path(name), expected);
    }

    #[test]
    fn test_from_dir_reads() {
        let dir = setup();
        let fs = FsFunc::from_dir(dir.path());
        assert_eq!(read_file(&fs, "hello.txt").unwrap(), b"hello world");
        assert_eq!(read_file(&fs, "nested/inner.txt").unwrap(), b"inner");
    }

    #[test]
    fn test_from_dir_stat() {
        let dir = setup();
        let fs = FsFunc::from_dir(dir.path());
        let file = fs.open("nested/inner.txt").unwrap();
        let info = file.stat().unwrap();
        assert_eq!(info.name(), "inner.txt");
        assert_eq!(info.size(), 5);
        assert!(!info.is_dir());
        assert!(info.modified().is_some());
    }

    #[test]
    fn test_from_dir_missing() {
        let dir = setup();
        let fs = FsFunc::from_dir(dir.path());
        assert_eq!(
            fs.open("nope.txt").err().unwrap(),
            FsError::NotExist {
                name: "nope.txt".to_string()
            }
        );
    }

    #[test]
    fn test_from_dir_rejects_escape() {
        let dir = setup();
        let fs = FsFunc::from_dir(dir.path().join("nested"));
        assert!(matches!(
            fs.open("../hello.txt").err().unwrap(),
            FsError::Invalid { .. }
        ));
        assert!(matches!(
            fs.open("/etc/hostname").err().unwrap(),
            FsError::Invalid { .. }
        ));
    }

    #[test]
    fn test_read_dir_lists_sorted() {
        let dir = setup();
        let entries = read_dir(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(DirEntry::name).collect();
        assert_eq!(names, vec!["hello.txt", "nested"]);
        assert!(!entries[0].is_dir());
        assert!(entries[1].is_dir());
        assert_eq!(entries[1].file_type(), FileMode::new(FileMode::DIR));
        assert_eq!(entries[0].info().unwrap().size(), 11);
    }

    #[test]
    fn test_from_files() {
        let mut files = BTreeMap::new();
        files.insert("docs/readme.md".to_string(), b"# title".to_vec());
        let fs = FsFunc::from_files(files);
        assert_eq!(read_file(&fs, "docs/readme.md").unwrap(), b"# title");
        let file = fs.open("docs/readme.md").unwrap();
        assert_eq!(file.stat().unwrap().name(), "readme.md");
        assert!(matches!(
            fs.open("docs").err().unwrap(),
            FsError::NotExist { .. }
        ));
    }
}
