//! Blob references stored in table records.

use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use pxdb_common::BinaryReader;

use crate::Result;

/// Size of the reference trailer at the end of every blob-typed field.
pub const BLOB_REF_SIZE: usize = 10;

/// Sub-allocation index marking a blob that owns whole blocks.
pub const SINGLE_BLOB_INDEX: u8 = 0xFF;

/// On-disk layout of the reference trailer.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawBlobRef {
    /// Block offset in the upper 24 bits, slot index in the low byte.
    offset_and_index: U32,
    length: U32,
    modification: U16,
}

/// Location of a blob payload inside the companion `.MB` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobRef {
    /// Byte offset of the owning block (multiple of 256).
    pub offset: u32,
    /// Slot in a sub-allocated block, or [`SINGLE_BLOB_INDEX`].
    pub index: u8,
    /// Payload length in bytes.
    pub length: u32,
    /// Modification number, must match the value stored with the blob.
    pub modification: u16,
}

impl BlobRef {
    /// Parse the 10-byte trailer of a blob field.
    pub fn parse(trailer: &[u8]) -> Result<Self> {
        let raw: RawBlobRef = BinaryReader::new(trailer).read_struct()?;
        let offset_and_index = raw.offset_and_index.get();
        Ok(Self {
            offset: offset_and_index & 0xFFFF_FF00,
            index: (offset_and_index & 0xFF) as u8,
            length: raw.length.get(),
            modification: raw.modification.get(),
        })
    }

    /// True when the blob owns whole blocks rather than a slot.
    #[inline]
    pub const fn is_single(&self) -> bool {
        self.index == SINGLE_BLOB_INDEX
    }

    /// Encode the trailer form.
    pub fn to_bytes(&self) -> [u8; BLOB_REF_SIZE] {
        let mut out = [0u8; BLOB_REF_SIZE];
        out[..4].copy_from_slice(&(self.offset | self.index as u32).to_le_bytes());
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out[8..].copy_from_slice(&self.modification.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_reference() {
        let trailer = [0x03, 0x10, 0x00, 0x00, 0x2C, 0x01, 0x00, 0x00, 0x02, 0x00];
        let blob = BlobRef::parse(&trailer).unwrap();

        assert_eq!(blob.offset, 0x1000);
        assert_eq!(blob.index, 3);
        assert_eq!(blob.length, 300);
        assert_eq!(blob.modification, 2);
        assert!(!blob.is_single());
        assert_eq!(blob.to_bytes(), trailer);
    }

    #[test]
    fn test_short_trailer() {
        assert!(BlobRef::parse(&[0xFF, 0x10]).is_err());
    }
}
