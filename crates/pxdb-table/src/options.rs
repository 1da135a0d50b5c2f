//! Options controlling how a table is opened.

use std::path::{Path, PathBuf};

/// Where to find the companion blob file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlobSource {
    /// Look for `NAME.MB` / `name.mb` next to the table.
    #[default]
    Auto,
    /// Use this file.
    Path(PathBuf),
    /// Do not attach a blob file.
    Disabled,
}

/// Builder-style configuration for [`Document::open_with`](crate::Document::open_with).
///
/// ```
/// use pxdb_table::OpenOptions;
///
/// let options = OpenOptions::new().strict(true).code_page_override(1252);
/// assert!(options.is_strict());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    strict: bool,
    blob: BlobSource,
    code_page: Option<u16>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the open when field widths disagree with the declared record size.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Read overflowed blobs from `path`.
    pub fn blob_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.blob = BlobSource::Path(path.as_ref().to_path_buf());
        self
    }

    /// Never attach a blob file; overflowed blobs decode as empty.
    pub fn no_blob_file(mut self) -> Self {
        self.blob = BlobSource::Disabled;
        self
    }

    /// Decode text with this code page instead of the header's.
    pub fn code_page_override(mut self, code_page: u16) -> Self {
        self.code_page = Some(code_page);
        self
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    #[inline]
    pub fn blob_source(&self) -> &BlobSource {
        &self.blob
    }

    #[inline]
    pub fn code_page(&self) -> Option<u16> {
        self.code_page
    }
}
