//! Error types for Paradox table reading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when opening a table or retrieving records.
///
/// Structural errors abort [`Document`](crate::Document) creation. Problems
/// with individual fields never surface here; they are recorded on the
/// [`Record`](crate::Record) as [`DecodeError`](crate::DecodeError)s.
#[derive(Debug, Error)]
pub enum Error {
    /// The table file could not be opened or mapped.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] pxdb_common::Error),

    /// Blob file error.
    #[error("blob file: {0}")]
    Blob(#[from] pxdb_blob::Error),

    /// The fixed header is truncated or describes an impossible table.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The field descriptor or name tables are truncated or invalid.
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// Field widths do not add up to the header's record size (strict mode).
    #[error("schema inconsistency: header declares {declared}-byte records, fields sum to {computed}")]
    SchemaInconsistency { declared: usize, computed: usize },

    /// Record number outside `[0, num_records)`.
    #[error("record {record} out of range (table has {count} records)")]
    OutOfRange { record: i64, count: usize },

    /// The block chain is not laid out sequentially.
    #[error("unsupported block layout: {0}")]
    UnsupportedLayout(String),

    /// An operation was attempted without an open document.
    #[error("no open document")]
    NoDocument,
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, Error>;
