//! Field descriptor and name tables.

use pxdb_common::{BinaryReader, CodePage};

use crate::field::FieldDescriptor;
use crate::header::Header;
use crate::{Error, Result};

/// Ordered column list plus the table name stored with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Record size implied by the field widths.
    pub fn record_size(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }
}

/// Parse descriptors and names from the header area.
///
/// Layout after the header: `num_fields` (type, size) byte pairs, a table
/// name pointer, one name pointer per field, the fixed-size table name
/// buffer, and finally the NUL-terminated field names.
pub fn parse_fields(bytes: &[u8], header: &Header, code_page: &CodePage) -> Result<Schema> {
    let num_fields = header.num_fields;
    if num_fields == 0 {
        return Err(Error::MalformedSchema("table declares no fields".into()));
    }

    let area = bytes.get(..header.header_size).ok_or_else(|| {
        Error::MalformedSchema(format!("header area of {} bytes is truncated", header.header_size))
    })?;
    let mut reader = BinaryReader::new_at(area, header.descriptor_offset());

    let descriptors = reader.read_bytes(num_fields * 2).map_err(|_| {
        Error::MalformedSchema(format!(
            "{num_fields} field descriptors overrun the {}-byte header",
            header.header_size
        ))
    })?;

    // pointers are runtime scratch space in the file; only their size matters
    let pointers = 4 + num_fields * 4;
    if reader.remaining() < pointers {
        return Err(Error::MalformedSchema("name pointer table overruns the header".into()));
    }
    reader.advance(pointers);

    let table_name = reader
        .read_cstring_in_buffer(header.table_name_size())
        .map_err(|_| Error::MalformedSchema("table name overruns the header".into()))?;
    let table_name = code_page.decode(table_name).into_owned();

    let mut fields = Vec::with_capacity(num_fields);
    for (index, pair) in descriptors.chunks_exact(2).enumerate() {
        let name = reader.read_cstring().map_err(|_| {
            Error::MalformedSchema(format!("name of field {index} is unterminated"))
        })?;
        let name = code_page.decode(name).into_owned();
        fields.push(FieldDescriptor::from_raw(name, pair[0], pair[1]));
    }

    Ok(Schema { table_name, fields })
}
