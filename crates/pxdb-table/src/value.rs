//! Decoded field values.

use std::fmt;

use pxdb_common::{Date, Decimal, Time, Timestamp};

/// A single decoded field.
///
/// `Null` is its own variant, never a zero or empty value of another kind.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    /// Short, Long and AutoIncrement fields.
    Integer(i64),
    /// Number and Currency fields.
    Float(f64),
    Logical(bool),
    Date(Date),
    Time(Time),
    Timestamp(Timestamp),
    /// BCD fields.
    Decimal(Decimal),
    /// Alpha and Memo fields.
    Text(String),
    /// Bytes, binary blob, OLE, graphic and unknown fields.
    Bytes(Vec<u8>),
}

impl FieldValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as a float, for integer, float and decimal fields.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Logical(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Timestamp(ts) => Some(ts.date()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_time(&self) -> Option<Time> {
        match self {
            Self::Time(t) => Some(*t),
            Self::Timestamp(ts) => Some(ts.time()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    #[inline]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Heap bytes owned by this value.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Text(s) => s.capacity(),
            Self::Bytes(b) => b.capacity(),
            _ => 0,
        }
    }

    /// Name of the variant, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Logical(_) => "logical",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// Floats compare by bit pattern, so a stored NaN equals itself.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Logical(a), Self::Logical(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Logical(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "{}", Hex(b)),
        }
    }
}

/// Lowercase hex rendering of a byte slice.
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Why a single field could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeReason {
    /// The record ended before the field's declared width.
    Truncated { needed: usize, available: usize },
    /// The stored bytes are not a valid value of the field's type.
    Invalid(String),
    /// A blob-typed field narrower than its reference trailer.
    BlobTooShort(usize),
    /// The companion blob file could not supply the payload.
    Blob(String),
}

impl fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "truncated: needed {needed} bytes, {available} available")
            }
            Self::Invalid(msg) => write!(f, "invalid value: {msg}"),
            Self::BlobTooShort(len) => write!(f, "blob field of {len} bytes has no room for a reference"),
            Self::Blob(msg) => write!(f, "blob: {msg}"),
        }
    }
}

/// A per-field decoding failure. The rest of the record is still decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub field: String,
    pub reason: DecodeReason,
}

impl DecodeError {
    pub fn new(field: impl Into<String>, reason: DecodeReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for DecodeError {}

#[cfg(feature = "serde")]
impl serde::Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::Serialize;

        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Logical(v) => serializer.serialize_bool(*v),
            Self::Date(d) => d.serialize(serializer),
            Self::Time(t) => t.serialize(serializer),
            Self::Timestamp(ts) => ts.serialize(serializer),
            Self::Decimal(d) => d.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bytes(b) => serializer.collect_str(&Hex(b)),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DecodeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("DecodeError", 2)?;
        state.serialize_field("field", &self.field)?;
        state.serialize_field("error", &self.reason.to_string())?;
        state.end()
    }
}
