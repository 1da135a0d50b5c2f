//! Error types for blob file reading.

use thiserror::Error;

/// Errors that can occur when reading a `.MB` blob file.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] pxdb_common::Error),

    /// The file does not start with a blob header block.
    #[error("invalid blob file header: {0}")]
    InvalidHeader(String),

    /// The referenced block is not of the expected kind.
    #[error("unexpected blob block type {actual} at offset {offset:#x} (expected {expected})")]
    UnexpectedBlockType { offset: u32, expected: u8, actual: u8 },

    /// The sub-allocation slot is out of range or unused.
    #[error("blob slot {index} at offset {offset:#x} is empty")]
    EmptySlot { offset: u32, index: u8 },

    /// The stored blob does not match the record's reference.
    #[error("blob {what} mismatch: record says {expected}, blob file says {actual}")]
    Mismatch {
        what: &'static str,
        expected: u32,
        actual: u32,
    },
}

/// Result type for blob operations.
pub type Result<T> = std::result::Result<T, Error>;
