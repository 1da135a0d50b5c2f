//! Binary reader for zero-copy parsing of byte slices.
//!
//! Header and block structures are read as zerocopy structs with
//! little-endian fields through [`BinaryReader::read_struct`]; record field
//! payloads are sliced out whole and decoded by [`crate::number`].
//! [`bytes_at`] covers bounds-checked random access.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// # Example
///
/// ```
/// use pxdb_common::BinaryReader;
///
/// let data = b"\x01\x02NAME\0";
/// let mut reader = BinaryReader::new(data);
///
/// assert_eq!(reader.read_bytes(2).unwrap(), &[0x01, 0x02]);
/// assert_eq!(reader.read_cstring().unwrap(), b"NAME");
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Advance the position by a number of bytes.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        bytes_at(self.data, self.position, count)
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a null-terminated byte string, consuming the terminator.
    ///
    /// The bytes are returned undecoded; Paradox names are in the table's
    /// code page, not UTF-8.
    pub fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let remaining = self.remaining_bytes();
        let null_pos = memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator)?;
        self.position += null_pos + 1;
        Ok(&remaining[..null_pos])
    }

    /// Read a fixed-size buffer, returning the bytes before the first null.
    pub fn read_cstring_in_buffer(&mut self, buffer_size: usize) -> Result<&'a [u8]> {
        let bytes = self.read_bytes(buffer_size)?;
        Ok(trim_nul(bytes))
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }
}

/// Borrow `len` bytes at `offset`, failing instead of panicking when the
/// range is not fully inside `data`.
#[inline]
pub fn bytes_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let available = data.len().saturating_sub(offset);
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(Error::UnexpectedEof {
            needed: len,
            available,
        }),
    }
}

/// Slice up to (not including) the first NUL byte.
#[inline]
pub fn trim_nul(bytes: &[u8]) -> &[u8] {
    match memchr::memchr(0, bytes) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}
