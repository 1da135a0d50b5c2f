//! Record decoding.

use log::trace;

use pxdb_blob::{BlobFile, BlobRef, BLOB_REF_SIZE};
use pxdb_common::number::{decode_bcd, decode_f64, decode_i16, decode_i32, decode_logical, is_null_pattern};
use pxdb_common::{trim_nul, BinaryReader, CodePage, Date, Time, Timestamp};

use crate::field::{FieldDescriptor, FieldType};
use crate::record::Record;
use crate::value::{DecodeError, DecodeReason, FieldValue};

/// Everything besides the raw bytes that decoding a record needs.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub code_page: CodePage,
    /// Companion blob file, when one is attached.
    pub blobs: Option<&'a BlobFile>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(code_page: CodePage, blobs: Option<&'a BlobFile>) -> Self {
        Self { code_page, blobs }
    }
}

impl Default for DecodeContext<'_> {
    fn default() -> Self {
        Self::new(CodePage::default(), None)
    }
}

/// Decode one record, field by field.
///
/// Always produces one entry per descriptor. A field that cannot be decoded
/// becomes a [`DecodeError`] entry and decoding carries on with the next.
pub fn decode_record(raw: &[u8], fields: &[FieldDescriptor], ctx: &DecodeContext<'_>) -> Record {
    let mut reader = BinaryReader::new(raw);
    let mut entries = Vec::with_capacity(fields.len());

    for field in fields {
        let entry = match reader.read_bytes(field.length) {
            Ok(bytes) => decode_field(bytes, field, ctx),
            Err(_) => {
                let available = reader.remaining();
                reader.advance(available);
                Err(DecodeError::new(
                    field.name.as_str(),
                    DecodeReason::Truncated {
                        needed: field.length,
                        available,
                    },
                ))
            }
        };
        entries.push(entry);
    }

    Record::new(entries)
}

/// Decode a single field from exactly `field.length` bytes.
pub fn decode_field(
    bytes: &[u8],
    field: &FieldDescriptor,
    ctx: &DecodeContext<'_>,
) -> Result<FieldValue, DecodeError> {
    if is_null_pattern(bytes) {
        return Ok(FieldValue::Null);
    }

    let invalid = |e: pxdb_common::Error| DecodeError::new(field.name.as_str(), DecodeReason::Invalid(e.to_string()));

    let value = match field.field_type {
        FieldType::Short => decode_i16(bytes)
            .map_err(invalid)?
            .map(|v| FieldValue::Integer(v as i64)),
        FieldType::Long | FieldType::AutoIncrement => decode_i32(bytes)
            .map_err(invalid)?
            .map(|v| FieldValue::Integer(v as i64)),
        FieldType::Number | FieldType::Currency => {
            decode_f64(bytes).map_err(invalid)?.map(FieldValue::Float)
        }
        FieldType::Logical => decode_logical(bytes).map_err(invalid)?.map(FieldValue::Logical),
        FieldType::Date => decode_i32(bytes)
            .map_err(invalid)?
            .map(|days| FieldValue::Date(Date::from_days(days))),
        FieldType::Time => match decode_i32(bytes).map_err(invalid)? {
            Some(millis) => Some(FieldValue::Time(
                Time::from_millis(millis as i64).map_err(invalid)?,
            )),
            None => None,
        },
        FieldType::Timestamp => match decode_f64(bytes).map_err(invalid)? {
            Some(millis) => Some(FieldValue::Timestamp(
                Timestamp::from_millis(millis).map_err(invalid)?,
            )),
            None => None,
        },
        FieldType::Bcd => decode_bcd(bytes, field.decimals)
            .map_err(invalid)?
            .map(FieldValue::Decimal),
        FieldType::Alpha => Some(FieldValue::Text(
            ctx.code_page.decode(trim_nul(bytes)).into_owned(),
        )),
        FieldType::Bytes | FieldType::Unknown(_) => Some(FieldValue::Bytes(bytes.to_vec())),
        FieldType::Memo
        | FieldType::Blob
        | FieldType::FormattedMemo
        | FieldType::Ole
        | FieldType::Graphic => Some(decode_blob(bytes, field, ctx)?),
    };

    Ok(value.unwrap_or(FieldValue::Null))
}

fn decode_blob(
    bytes: &[u8],
    field: &FieldDescriptor,
    ctx: &DecodeContext<'_>,
) -> Result<FieldValue, DecodeError> {
    let blob_error = |reason| DecodeError::new(field.name.as_str(), reason);

    if bytes.len() < BLOB_REF_SIZE {
        return Err(blob_error(DecodeReason::BlobTooShort(bytes.len())));
    }
    let (inline, trailer) = bytes.split_at(bytes.len() - BLOB_REF_SIZE);
    let blob = BlobRef::parse(trailer).map_err(|e| blob_error(DecodeReason::Blob(e.to_string())))?;

    if blob.length == 0 {
        return Ok(FieldValue::Null);
    }

    let payload = if blob.length as usize <= inline.len() {
        &inline[..blob.length as usize]
    } else {
        match ctx.blobs {
            Some(file) => file
                .read(&blob)
                .map_err(|e| blob_error(DecodeReason::Blob(e.to_string())))?,
            None => {
                trace!(
                    "Field {} references {} bytes in a missing blob file",
                    field.name,
                    blob.length
                );
                &[]
            }
        }
    };

    Ok(match field.field_type {
        FieldType::Memo => FieldValue::Text(ctx.code_page.decode(payload).into_owned()),
        _ => FieldValue::Bytes(payload.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxdb_common::number::{encode_bcd, encode_f64, encode_i16, encode_i32};
    use pxdb_common::Decimal;

    fn field(name: &str, tag: u8, size: u8) -> FieldDescriptor {
        FieldDescriptor::from_raw(name.into(), tag, size)
    }

    fn decode_one(bytes: &[u8], field: &FieldDescriptor) -> Result<FieldValue, DecodeError> {
        decode_field(bytes, field, &DecodeContext::default())
    }

    #[test]
    fn test_sign_flipped_short() {
        let value = decode_one(&[0x80, 0x2A], &field("N", 0x03, 2)).unwrap();
        assert_eq!(value, FieldValue::Integer(42));
        let value = decode_one(&encode_i16(-7), &field("N", 0x03, 2)).unwrap();
        assert_eq!(value, FieldValue::Integer(-7));
    }

    #[test]
    fn test_numeric_types() {
        let long = field("L", 0x04, 4);
        assert_eq!(decode_one(&encode_i32(-100_000), &long).unwrap(), FieldValue::Integer(-100_000));

        let number = field("F", 0x06, 8);
        assert_eq!(decode_one(&encode_f64(-2.5), &number).unwrap(), FieldValue::Float(-2.5));
        let currency = field("C", 0x05, 8);
        assert_eq!(decode_one(&encode_f64(19.99), &currency).unwrap(), FieldValue::Float(19.99));

        let bcd = field("B", 0x17, 2);
        let stored = encode_bcd(Decimal::new(-12345, 2));
        assert_eq!(
            decode_one(&stored, &bcd).unwrap().to_string(),
            "-123.45"
        );
    }

    #[test]
    fn test_logical() {
        let logical = field("Activo", 0x09, 1);
        assert_eq!(decode_one(&[0x81], &logical).unwrap(), FieldValue::Logical(true));
        assert_eq!(decode_one(&[0x80], &logical).unwrap(), FieldValue::Logical(false));
        assert_eq!(decode_one(&[0x00], &logical).unwrap(), FieldValue::Null);
    }

    #[test]
    fn test_calendar_types() {
        let date = field("Alta", 0x02, 4);
        let value = decode_one(&encode_i32(730_120), &date).unwrap();
        assert_eq!(value.to_string(), "2000-01-01");

        let time = field("Hora", 0x14, 4);
        let value = decode_one(&encode_i32(45_296_500), &time).unwrap();
        assert_eq!(value.to_string(), "12:34:56.500");

        let stamp = field("Creado", 0x15, 8);
        let millis = 730_120.0 * 86_400_000.0 + 3_600_000.0;
        let value = decode_one(&encode_f64(millis), &stamp).unwrap();
        assert_eq!(value.to_string(), "2000-01-01 01:00:00");

        let bad = decode_one(&encode_i32(90_000_000), &time).unwrap_err();
        assert!(matches!(bad.reason, DecodeReason::Invalid(_)));
    }

    #[test]
    fn test_null_for_every_type() {
        let cases = [
            (0x01, 10),
            (0x02, 4),
            (0x03, 2),
            (0x04, 4),
            (0x05, 8),
            (0x06, 8),
            (0x09, 1),
            (0x0C, 20),
            (0x0D, 10),
            (0x0E, 16),
            (0x0F, 20),
            (0x10, 12),
            (0x14, 4),
            (0x15, 8),
            (0x16, 4),
            (0x17, 2),
            (0x18, 4),
            (0x42, 3),
            (0xFF, 1),
        ];
        for (tag, size) in cases {
            let desc = field("X", tag, size);
            let zeros = vec![0u8; desc.length];
            assert_eq!(decode_one(&zeros, &desc).unwrap(), FieldValue::Null, "tag {tag:#x}");
        }
    }

    #[test]
    fn test_alpha_with_code_page() {
        let ctx = DecodeContext::new(CodePage::from_id(850), None);
        let desc = field("Nombre", 0x01, 8);
        let value = decode_field(b"Pe\xa4a\0\0\0\0", &desc, &ctx).unwrap();
        assert_eq!(value, FieldValue::Text("Peña".into()));
    }

    #[test]
    fn test_inline_memo() {
        let desc = field("Notas", 0x0C, 20);
        let mut bytes = vec![0u8; 20];
        bytes[..5].copy_from_slice(b"corto");
        bytes[10..].copy_from_slice(
            &BlobRef {
                offset: 0,
                index: 0,
                length: 5,
                modification: 1,
            }
            .to_bytes(),
        );
        assert_eq!(decode_one(&bytes, &desc).unwrap(), FieldValue::Text("corto".into()));
    }

    #[test]
    fn test_external_blob_without_file() {
        let desc = field("Foto", 0x10, 10);
        let bytes = BlobRef {
            offset: 0x1000,
            index: 0xFF,
            length: 500,
            modification: 1,
        }
        .to_bytes();
        assert_eq!(decode_one(&bytes, &desc).unwrap(), FieldValue::Bytes(Vec::new()));
    }

    #[test]
    fn test_external_blob_from_file() {
        let mut mb = vec![0u8; 8192];
        mb[4096] = 2;
        mb[4097..4099].copy_from_slice(&1u16.to_le_bytes());
        mb[4099..4103].copy_from_slice(&12u32.to_le_bytes());
        mb[4103..4105].copy_from_slice(&3u16.to_le_bytes());
        mb[4105..4117].copy_from_slice(b"texto largo!");
        let file = BlobFile::from_bytes(mb).unwrap();
        let ctx = DecodeContext::new(CodePage::default(), Some(&file));

        let desc = field("Notas", 0x0C, 12);
        let mut bytes = vec![b'x', b'y'];
        bytes.extend_from_slice(
            &BlobRef {
                offset: 4096,
                index: 0xFF,
                length: 12,
                modification: 3,
            }
            .to_bytes(),
        );
        assert_eq!(
            decode_field(&bytes, &desc, &ctx).unwrap(),
            FieldValue::Text("texto largo!".into())
        );

        // stale modification number is a per-field error
        bytes[10] = 4;
        let err = decode_field(&bytes, &desc, &ctx).unwrap_err();
        assert!(matches!(err.reason, DecodeReason::Blob(_)));
    }

    #[test]
    fn test_blob_too_short() {
        let err = decode_one(&[1, 2, 3, 4], &field("Bin", 0x0D, 4)).unwrap_err();
        assert_eq!(err.reason, DecodeReason::BlobTooShort(4));
    }

    #[test]
    fn test_truncated_record_continues() {
        let fields = [field("A", 0x03, 2), field("B", 0x04, 4), field("C", 0x03, 2)];
        let record = decode_record(&[0x80, 0x01, 0x80, 0x00], &fields, &DecodeContext::default());

        assert_eq!(record.len(), 3);
        assert_eq!(record.value(0), Some(&FieldValue::Integer(1)));
        assert_eq!(
            record.error(1).map(|e| &e.reason),
            Some(&DecodeReason::Truncated {
                needed: 4,
                available: 2
            })
        );
        assert!(matches!(
            record.error(2).map(|e| &e.reason),
            Some(DecodeReason::Truncated { available: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_type_as_bytes() {
        let value = decode_one(&[1, 2, 3], &field("R", 0x30, 3)).unwrap();
        assert_eq!(value, FieldValue::Bytes(vec![1, 2, 3]));
    }
}
