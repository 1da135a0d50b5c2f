//! Error types for pxdb-common.

use thiserror::Error;

/// Common error type for pxdb operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A fixed-width codec was handed a slice of the wrong size.
    #[error("invalid width for {kind}: expected {expected} bytes, got {actual}")]
    InvalidWidth {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A BCD digit nibble was outside 0..=9.
    #[error("invalid BCD digit {0:#x}")]
    InvalidBcdDigit(u8),

    /// A day or millisecond count that does not map onto the calendar.
    #[error("{0} out of calendar range")]
    CalendarRange(&'static str),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
