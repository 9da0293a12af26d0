//! File mode bits.

use std::fmt;

/// Permission bits plus a directory flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
    /// Directory flag.
    pub const DIR: u32 = 1 << 31;

    const PERM_MASK: u32 = 0o777;

    /// Raw mode bits.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Regular file with permissions `perm`.
    #[must_use]
    pub const fn file(perm: u32) -> Self {
        Self(perm & Self::PERM_MASK)
    }

    /// Directory with permissions `perm`.
    #[must_use]
    pub const fn dir(perm: u32) -> Self {
        Self(Self::DIR | (perm & Self::PERM_MASK))
    }

    /// Derives a mode from on-disk metadata.
    #[must_use]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let perm = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & Self::PERM_MASK
        };
        #[cfg(not(unix))]
        let perm = if meta.permissions().readonly() {
            0o444
        } else {
            0o666
        };
        if meta.is_dir() {
            Self::dir(perm)
        } else {
            Self::file(perm)
        }
    }

    /// All bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Unix permission bits.
    #[must_use]
    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    /// Whether the directory flag is set.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR != 0
    }

    /// Type bits only, permissions cleared.
    #[must_use]
    pub const fn file_type(self) -> Self {
        Self(self.0 & !Self::PERM_MASK)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(10);
        out.push(if self.is_dir() { 'd' } else { '-' });
        for (i, c) in "rwxrwxrwx".chars().enumerate() {
            let bit = 1 << (8 - i);
            out.push(if self.0 & bit == 0 { '-' } else { c });
        }
        f.write_str(&out)
    }
}
