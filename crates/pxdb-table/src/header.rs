//! Paradox table header.
//!
//! Every `.DB` file starts with a 0x58-byte little-endian header. Data files
//! of version 4.0 and later append a 0x20-byte extension carrying, among
//! other things, the DOS code page.

use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use pxdb_common::BinaryReader;

use crate::{Error, Result};

/// Size of the base header.
pub const BASE_HEADER_SIZE: usize = 0x58;

/// Size of the extension following the base header in version >= 40 files.
pub const DATA_HEADER_SIZE: usize = 0x20;

/// On-disk base header.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawHeader {
    record_size: U16,
    header_size: U16,
    file_type: u8,
    /// Block size in KiB.
    max_table_size: u8,
    num_records: U32,
    /// Number of blocks in use.
    next_block: U16,
    file_blocks: U16,
    first_block: U16,
    last_block: U16,
    _unknown_12: [u8; 2],
    _modified_flags1: u8,
    _index_field_number: u8,
    _primary_index_workspace: U32,
    _unknown_1a: [u8; 7],
    num_fields: U16,
    primary_key_fields: U16,
    encryption1: U32,
    sort_order: u8,
    _modified_flags2: u8,
    _unknown_2b: [u8; 2],
    _change_count1: u8,
    _change_count2: u8,
    _unknown_2f: u8,
    _table_name_ptr: U32,
    _field_info_ptr: U32,
    write_protected: u8,
    file_version_id: u8,
    _max_blocks: U16,
    _unknown_3c: u8,
    _aux_passwords: u8,
    _unknown_3e: [u8; 2],
    _crypt_info_start: U32,
    _crypt_info_end: U32,
    _unknown_48: u8,
    auto_increment: U32,
    _first_free_block: U16,
    _index_update_required: u8,
    _unknown_50: u8,
    _real_header_size: U16,
    _unknown_53: [u8; 2],
    _ref_integrity: u8,
    _unknown_56: [u8; 2],
}

/// On-disk header extension of version >= 40 data files.
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawDataHeader {
    _file_ver_id3: U16,
    _file_ver_id4: U16,
    encryption2: U32,
    _file_update_time: U32,
    _hi_field_id: U16,
    _hi_field_id_info: U16,
    _sometimes_num_fields: U16,
    dos_code_page: U16,
    _unknown_6c: [u8; 4],
    _change_count4: U16,
    _unknown_72: [u8; 6],
}

/// Kind of data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Table with a primary index (`.PX`).
    IndexedDb,
    /// Table without a primary key.
    NonIndexedDb,
}

impl FileType {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::IndexedDb),
            2 => Some(Self::NonIndexedDb),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::IndexedDb => "indexed",
            Self::NonIndexedDb => "non-indexed",
        }
    }
}

/// Map the header's file version id to the Paradox version times ten.
pub fn file_version_from_id(id: u8) -> Option<u16> {
    match id {
        3 => Some(30),
        4 => Some(35),
        5..=9 => Some(40),
        10 | 11 => Some(50),
        12 => Some(70),
        _ => None,
    }
}

/// Global table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Paradox version times ten (30, 35, 40, 50 or 70).
    pub file_version: u16,
    pub file_type: FileType,
    /// Bytes before the first data block.
    pub header_size: usize,
    /// Declared record size in bytes.
    pub record_size: usize,
    pub num_records: usize,
    pub num_fields: usize,
    /// Block size in bytes.
    pub block_size: usize,
    /// DOS code page, 0 when the file predates the field.
    pub code_page: u16,
    pub first_block: u16,
    pub last_block: u16,
    pub blocks_in_use: u16,
    pub file_blocks: u16,
    pub primary_key_fields: u16,
    pub sort_order: u8,
    pub write_protected: bool,
    /// Next auto-increment value.
    pub auto_increment: u32,
}

impl Header {
    /// Whether the header carries the version >= 40 extension.
    #[inline]
    pub const fn has_data_header(&self) -> bool {
        self.file_version >= 40
    }

    /// Offset of the field descriptor array.
    #[inline]
    pub const fn descriptor_offset(&self) -> usize {
        if self.has_data_header() {
            BASE_HEADER_SIZE + DATA_HEADER_SIZE
        } else {
            BASE_HEADER_SIZE
        }
    }

    /// Size of the fixed table name buffer in the schema area.
    #[inline]
    pub const fn table_name_size(&self) -> usize {
        if self.file_version >= 70 {
            261
        } else {
            79
        }
    }

    /// File offset of 1-based block `block`.
    #[inline]
    pub fn block_offset(&self, block: u16) -> usize {
        self.header_size + (block as usize).saturating_sub(1) * self.block_size
    }
}

/// Parse the header at the start of a table file.
///
/// `bytes` is the whole file so the declared header size can be checked
/// against its length.
pub fn parse_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < BASE_HEADER_SIZE {
        return Err(Error::MalformedHeader(format!(
            "file is {} bytes, header needs {BASE_HEADER_SIZE}",
            bytes.len()
        )));
    }

    let mut reader = BinaryReader::new(bytes);
    let raw: RawHeader = reader.read_struct()?;

    let file_version = file_version_from_id(raw.file_version_id).ok_or_else(|| {
        Error::MalformedHeader(format!("unknown file version id {}", raw.file_version_id))
    })?;

    let file_type = FileType::from_raw(raw.file_type).ok_or_else(|| {
        Error::MalformedHeader(format!("file type {} is not a data table", raw.file_type))
    })?;

    let header_size = raw.header_size.get() as usize;
    if header_size > bytes.len() {
        return Err(Error::MalformedHeader(format!(
            "declared header size {header_size} exceeds file length {}",
            bytes.len()
        )));
    }

    let (code_page, encryption) = if file_version >= 40 {
        let minimum = BASE_HEADER_SIZE + DATA_HEADER_SIZE;
        if header_size < minimum {
            return Err(Error::MalformedHeader(format!(
                "declared header size {header_size} is below {minimum}"
            )));
        }
        let ext: RawDataHeader = reader.read_struct()?;
        (ext.dos_code_page.get(), ext.encryption2.get())
    } else {
        if header_size < BASE_HEADER_SIZE {
            return Err(Error::MalformedHeader(format!(
                "declared header size {header_size} is below {BASE_HEADER_SIZE}"
            )));
        }
        (0, raw.encryption1.get())
    };

    if encryption != 0 {
        return Err(Error::MalformedHeader(format!(
            "table is encrypted ({encryption:#010x})"
        )));
    }

    let num_records = raw.num_records.get() as usize;
    let block_size = raw.max_table_size as usize * 1024;
    if block_size == 0 && num_records > 0 {
        return Err(Error::MalformedHeader(format!(
            "block size is 0 with {num_records} records"
        )));
    }

    Ok(Header {
        file_version,
        file_type,
        header_size,
        record_size: raw.record_size.get() as usize,
        num_records,
        num_fields: raw.num_fields.get() as usize,
        block_size,
        code_page,
        first_block: raw.first_block.get(),
        last_block: raw.last_block.get(),
        blocks_in_use: raw.next_block.get(),
        file_blocks: raw.file_blocks.get(),
        primary_key_fields: raw.primary_key_fields.get(),
        sort_order: raw.sort_order,
        write_protected: raw.write_protected != 0,
        auto_increment: raw.auto_increment.get(),
    })
}

#[cfg(feature = "serde")]
impl serde::Serialize for Header {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Header", 12)?;
        state.serialize_field("file_version", &self.file_version)?;
        state.serialize_field("file_type", self.file_type.name())?;
        state.serialize_field("header_size", &self.header_size)?;
        state.serialize_field("record_size", &self.record_size)?;
        state.serialize_field("num_records", &self.num_records)?;
        state.serialize_field("num_fields", &self.num_fields)?;
        state.serialize_field("block_size", &self.block_size)?;
        state.serialize_field("code_page", &self.code_page)?;
        state.serialize_field("first_block", &self.first_block)?;
        state.serialize_field("primary_key_fields", &self.primary_key_fields)?;
        state.serialize_field("write_protected", &self.write_protected)?;
        state.serialize_field("auto_increment", &self.auto_increment)?;
        state.end()
    }
}
