//! Companion blob file access.

use std::path::{Path, PathBuf};

use log::{debug, trace};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use pxdb_common::{bytes_at, BinaryReader, FileBuffer};

use crate::{BlobRef, Error, Result};

/// Blob files are organized in 4 KiB blocks.
pub const BLOB_BLOCK_SIZE: usize = 4096;

const BLOCK_HEADER: u8 = 0;
const BLOCK_SINGLE: u8 = 2;
const BLOCK_SUBALLOCATED: u8 = 3;

/// Slots in a sub-allocated block.
pub const SLOTS_PER_BLOCK: u8 = 64;

const SUBALLOCATED_HEADER_SIZE: usize = 12;

/// Header of a block holding exactly one blob.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct SingleBlobHeader {
    kind: u8,
    block_count: U16,
    length: U32,
    modification: U16,
}

/// Pointer table entry of a sub-allocated block.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct SlotEntry {
    /// Payload offset within the block, in 16-byte units. Zero means unused.
    data_offset: u8,
    /// Payload length in 16-byte units, rounded up.
    length_units: u8,
    modification: U16,
    /// Payload length modulo 16.
    length_remainder: u8,
}

impl SlotEntry {
    fn length(&self) -> u32 {
        let units = self.length_units as u32;
        match self.length_remainder as u32 {
            0 => units * 16,
            rem => units.saturating_sub(1) * 16 + rem,
        }
    }
}

/// A Paradox `.MB` file holding memo and blob payloads too large for
/// their record.
#[derive(Debug)]
pub struct BlobFile {
    storage: FileBuffer,
    path: Option<PathBuf>,
}

impl BlobFile {
    /// Open and memory-map a blob file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let storage = FileBuffer::open(path)?;
        debug!("Opened blob file {} ({} bytes)", path.display(), storage.len());

        Self::validate(&storage)?;
        Ok(Self {
            storage,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory blob file.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::validate(&data)?;
        Ok(Self {
            storage: FileBuffer::Owned(data),
            path: None,
        })
    }

    fn validate(data: &[u8]) -> Result<()> {
        match data.first() {
            None => Err(Error::InvalidHeader("file is empty".into())),
            Some(&BLOCK_HEADER) => Ok(()),
            Some(&kind) => Err(Error::InvalidHeader(format!(
                "first block has type {kind}, expected {BLOCK_HEADER}"
            ))),
        }
    }

    /// Path the file was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.storage.as_bytes().len()
    }

    /// Check whether the file holds no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the payload a record's reference points to.
    pub fn read(&self, blob: &BlobRef) -> Result<&[u8]> {
        trace!(
            "Reading blob at {:#x} slot {:#04x} ({} bytes)",
            blob.offset,
            blob.index,
            blob.length
        );
        if blob.is_single() {
            self.read_single(blob)
        } else {
            self.read_slot(blob)
        }
    }

    fn read_single(&self, blob: &BlobRef) -> Result<&[u8]> {
        let data = self.storage.as_bytes();
        let start = blob.offset as usize;
        let mut reader = BinaryReader::new_at(data, start);
        let header: SingleBlobHeader = reader.read_struct()?;

        if header.kind != BLOCK_SINGLE {
            return Err(Error::UnexpectedBlockType {
                offset: blob.offset,
                expected: BLOCK_SINGLE,
                actual: header.kind,
            });
        }
        check("length", blob.length, header.length.get())?;
        check(
            "modification number",
            blob.modification as u32,
            header.modification.get() as u32,
        )?;
        trace!("Single blob spans {} blocks", header.block_count.get());

        Ok(reader.read_bytes(blob.length as usize)?)
    }

    fn read_slot(&self, blob: &BlobRef) -> Result<&[u8]> {
        let data = self.storage.as_bytes();
        let start = blob.offset as usize;

        let kind = bytes_at(data, start, 1)?[0];
        if kind != BLOCK_SUBALLOCATED {
            return Err(Error::UnexpectedBlockType {
                offset: blob.offset,
                expected: BLOCK_SUBALLOCATED,
                actual: kind,
            });
        }
        if blob.index >= SLOTS_PER_BLOCK {
            return Err(Error::EmptySlot {
                offset: blob.offset,
                index: blob.index,
            });
        }

        let entry_offset = start + SUBALLOCATED_HEADER_SIZE + blob.index as usize * 5;
        let entry: SlotEntry = BinaryReader::new_at(data, entry_offset).read_struct()?;
        if entry.data_offset == 0 {
            return Err(Error::EmptySlot {
                offset: blob.offset,
                index: blob.index,
            });
        }
        check("length", blob.length, entry.length())?;
        check(
            "modification number",
            blob.modification as u32,
            entry.modification.get() as u32,
        )?;

        let payload = start + entry.data_offset as usize * 16;
        Ok(bytes_at(data, payload, blob.length as usize)?)
    }
}

#[inline]
fn check(what: &'static str, expected: u32, actual: u32) -> Result<()> {
    if expected != actual {
        return Err(Error::Mismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
