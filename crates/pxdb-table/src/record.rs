//! Decoded records.

use crate::value::{DecodeError, FieldValue};

/// One decoded record: an entry per field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    entries: Vec<Result<FieldValue, DecodeError>>,
}

impl Record {
    pub(crate) fn new(entries: Vec<Result<FieldValue, DecodeError>>) -> Self {
        Self { entries }
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for field `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Result<FieldValue, DecodeError>> {
        self.entries.get(index)
    }

    /// Decoded value of field `index`, `None` if out of range or undecodable.
    #[inline]
    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.entries.get(index)?.as_ref().ok()
    }

    /// Decode error of field `index`, if it failed.
    #[inline]
    pub fn error(&self, index: usize) -> Option<&DecodeError> {
        self.entries.get(index)?.as_ref().err()
    }

    /// All per-field errors.
    pub fn errors(&self) -> impl Iterator<Item = &DecodeError> {
        self.entries.iter().filter_map(|e| e.as_ref().err())
    }

    /// True when every field decoded.
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(Result::is_ok)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Result<FieldValue, DecodeError>> {
        self.entries.iter()
    }

    /// Consume the record field by field, returning the payload bytes freed.
    pub fn release(self) -> usize {
        let mut released = 0;
        for entry in self.entries {
            if let Ok(value) = &entry {
                released += value.payload_len();
            }
            drop(entry);
        }
        released
    }
}

impl IntoIterator for Record {
    type Item = Result<FieldValue, DecodeError>;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Result<FieldValue, DecodeError>;
    type IntoIter = std::slice::Iter<'a, Result<FieldValue, DecodeError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            match entry {
                Ok(value) => seq.serialize_element(value)?,
                Err(err) => seq.serialize_element(err)?,
            }
        }
        seq.end()
    }
}
