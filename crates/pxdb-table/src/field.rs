//! Field types and descriptors.

use std::fmt;

use pxdb_blob::BLOB_REF_SIZE;
use pxdb_common::number::BCD_WIDTH;

/// Paradox field type, as stored in the descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Alpha,
    Date,
    Short,
    Long,
    Currency,
    Number,
    Logical,
    Memo,
    Blob,
    FormattedMemo,
    Ole,
    Graphic,
    Time,
    Timestamp,
    AutoIncrement,
    Bcd,
    Bytes,
    /// A tag this reader does not know; decoded as raw bytes.
    Unknown(u8),
}

impl FieldType {
    /// Map a descriptor type tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            0x01 => Self::Alpha,
            0x02 => Self::Date,
            0x03 => Self::Short,
            0x04 => Self::Long,
            0x05 => Self::Currency,
            0x06 => Self::Number,
            0x09 => Self::Logical,
            0x0C => Self::Memo,
            0x0D => Self::Blob,
            0x0E => Self::FormattedMemo,
            0x0F => Self::Ole,
            0x10 => Self::Graphic,
            0x14 => Self::Time,
            0x15 => Self::Timestamp,
            0x16 => Self::AutoIncrement,
            0x17 => Self::Bcd,
            0x18 => Self::Bytes,
            other => Self::Unknown(other),
        }
    }

    /// The descriptor type tag.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Alpha => 0x01,
            Self::Date => 0x02,
            Self::Short => 0x03,
            Self::Long => 0x04,
            Self::Currency => 0x05,
            Self::Number => 0x06,
            Self::Logical => 0x09,
            Self::Memo => 0x0C,
            Self::Blob => 0x0D,
            Self::FormattedMemo => 0x0E,
            Self::Ole => 0x0F,
            Self::Graphic => 0x10,
            Self::Time => 0x14,
            Self::Timestamp => 0x15,
            Self::AutoIncrement => 0x16,
            Self::Bcd => 0x17,
            Self::Bytes => 0x18,
            Self::Unknown(tag) => *tag,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Alpha => "Alpha",
            Self::Date => "Date",
            Self::Short => "Short",
            Self::Long => "Long",
            Self::Currency => "Currency",
            Self::Number => "Number",
            Self::Logical => "Logical",
            Self::Memo => "Memo",
            Self::Blob => "Blob",
            Self::FormattedMemo => "FormattedMemo",
            Self::Ole => "OLE",
            Self::Graphic => "Graphic",
            Self::Time => "Time",
            Self::Timestamp => "Timestamp",
            Self::AutoIncrement => "AutoIncrement",
            Self::Bcd => "BCD",
            Self::Bytes => "Bytes",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Whether values carry a blob reference trailer.
    pub const fn is_blob(&self) -> bool {
        matches!(
            self,
            Self::Memo | Self::Blob | Self::FormattedMemo | Self::Ole | Self::Graphic
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(tag) => write!(f, "Unknown({tag:#04x})"),
            other => f.write_str(other.name()),
        }
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Column name, decoded with the table's code page.
    pub name: String,
    /// Stored type.
    pub field_type: FieldType,
    /// Width in bytes within a record.
    pub length: usize,
    /// Fractional digits, for BCD fields; zero otherwise.
    pub decimals: u8,
}

impl FieldDescriptor {
    /// Build a descriptor from the raw (tag, size) pair. BCD stores the
    /// number of decimals in the size byte and is always 17 bytes wide.
    pub fn from_raw(name: String, tag: u8, size: u8) -> Self {
        let field_type = FieldType::from_tag(tag);
        let (length, decimals) = match field_type {
            FieldType::Bcd => (BCD_WIDTH, size),
            _ => (size as usize, 0),
        };
        Self {
            name,
            field_type,
            length,
            decimals,
        }
    }

    /// Bytes available for an inline blob prefix, if this is a blob field.
    pub fn inline_blob_capacity(&self) -> Option<usize> {
        if self.field_type.is_blob() {
            self.length.checked_sub(BLOB_REF_SIZE)
        } else {
            None
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FieldDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FieldDescriptor", 5)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", self.field_type.name())?;
        state.serialize_field("tag", &self.field_type.tag())?;
        state.serialize_field("length", &self.length)?;
        state.serialize_field("decimals", &self.decimals)?;
        state.end()
    }
}
