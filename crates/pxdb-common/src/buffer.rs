//! File contents backed by a memory map or an owned buffer.

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

/// Read-only bytes of a table or blob file.
#[derive(Debug)]
pub enum FileBuffer {
    /// Memory-mapped file contents.
    Mapped(Mmap),
    /// Owned contents (in-memory tables, empty files).
    Owned(Vec<u8>),
}

impl FileBuffer {
    /// Memory-map a file. Empty files are not mappable and yield an empty
    /// owned buffer instead.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::Owned(Vec::new()));
        }
        // SAFETY: the mapping is read-only and the file is not modified by
        // this process while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(mmap))
    }

    /// Whether the contents are memory-mapped.
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }

    /// The file contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => &mmap[..],
            Self::Owned(data) => &data[..],
        }
    }
}

impl Deref for FileBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for FileBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::Owned(data)
    }
}
