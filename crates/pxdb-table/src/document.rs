//! Open tables.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use pxdb_blob::BlobFile;
use pxdb_common::{bytes_at, CodePage, FileBuffer};

use crate::block::{BlockIndex, BlockLayout, RecordLocation};
use crate::decoder::{decode_record, DecodeContext};
use crate::field::FieldDescriptor;
use crate::header::{parse_header, Header};
use crate::options::{BlobSource, OpenOptions};
use crate::record::Record;
use crate::schema::{parse_fields, Schema};
use crate::{Error, Result};

/// An open Paradox table.
///
/// Owns the mapped file, the parsed header and schema, the block index and
/// the companion blob file if one was found. Retrieval borrows the document
/// immutably, so records may be read from several threads at once.
#[derive(Debug)]
pub struct Document {
    data: FileBuffer,
    path: Option<PathBuf>,
    header: Header,
    schema: Schema,
    code_page: CodePage,
    blocks: BlockIndex,
    blobs: Option<BlobFile>,
}

impl Document {
    /// Open a table with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    /// Open a table.
    pub fn open_with<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = FileBuffer::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Opened {} ({} bytes, {})",
            path.display(),
            data.len(),
            if data.is_mapped() { "mapped" } else { "owned" }
        );

        let mut doc = Self::parse(data, options)?;
        doc.path = Some(path.to_path_buf());
        doc.blobs = match options.blob_source() {
            BlobSource::Auto => find_blob_file(path).and_then(|mb| match BlobFile::open(&mb) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("Ignoring blob file {}: {e}", mb.display());
                    None
                }
            }),
            BlobSource::Path(mb) => Some(BlobFile::open(mb)?),
            BlobSource::Disabled => None,
        };
        doc.check_blob_file(options);
        Ok(doc)
    }

    /// Parse a table image held in memory.
    ///
    /// An explicit [`OpenOptions::blob_file`] is honored; there is no
    /// directory to search otherwise.
    pub fn from_bytes(bytes: Vec<u8>, options: &OpenOptions) -> Result<Self> {
        let mut doc = Self::parse(FileBuffer::from(bytes), options)?;
        if let BlobSource::Path(mb) = options.blob_source() {
            doc.blobs = Some(BlobFile::open(mb)?);
        }
        Ok(doc)
    }

    /// Attach a companion blob file, replacing any found at open.
    pub fn with_blob_file(mut self, blobs: BlobFile) -> Self {
        self.blobs = Some(blobs);
        self
    }

    fn parse(data: FileBuffer, options: &OpenOptions) -> Result<Self> {
        let header = parse_header(&data)?;

        let code_page = CodePage::from_id(options.code_page().unwrap_or(header.code_page));
        if !code_page.is_exact() && code_page.id() != 0 {
            warn!("Unknown code page {}, decoding text as {}", code_page.id(), code_page.label());
        }

        let schema = parse_fields(&data, &header, &code_page)?;

        let computed = schema.record_size();
        if computed != header.record_size {
            if options.is_strict() {
                return Err(Error::SchemaInconsistency {
                    declared: header.record_size,
                    computed,
                });
            }
            warn!(
                "Header declares {}-byte records but fields sum to {computed}; using {computed}",
                header.record_size
            );
        }

        let blocks = BlockIndex::build(&data, &header, computed);
        if let BlockLayout::Fragmented { reason } = blocks.layout() {
            warn!("Records cannot be located: {reason}");
            if computed != header.record_size {
                warn!(
                    "Chain was walked with {computed}-byte records; the header's {}-byte record size disagrees with the fields",
                    header.record_size
                );
            }
        }

        debug!(
            "Table {:?}: version {}, {} records, {} fields, {}-byte records, {}-byte blocks, code page {}",
            schema.table_name,
            header.file_version,
            header.num_records,
            schema.fields.len(),
            computed,
            header.block_size,
            code_page.label()
        );

        Ok(Self {
            data,
            path: None,
            header,
            schema,
            code_page,
            blocks,
            blobs: None,
        })
    }

    fn check_blob_file(&self, options: &OpenOptions) {
        let has_blobs = self.schema.fields.iter().any(|f| f.field_type.is_blob());
        if !has_blobs {
            return;
        }
        match &self.blobs {
            Some(file) => debug!(
                "Using blob file {}",
                file.path().map(|p| p.display().to_string()).unwrap_or_default()
            ),
            None if options.blob_source() != &BlobSource::Disabled => {
                warn!("Table has blob fields but no blob file; overflowed values read as empty")
            }
            None => {}
        }
    }

    /// Path the table was opened from.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn table_name(&self) -> &str {
        &self.schema.table_name
    }

    #[inline]
    pub fn num_records(&self) -> usize {
        self.header.num_records
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Field descriptors in record order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.schema.fields
    }

    #[inline]
    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.schema.fields.get(index)
    }

    /// Record size used for reading, derived from the field widths.
    #[inline]
    pub fn record_size(&self) -> usize {
        self.blocks.record_size()
    }

    #[inline]
    pub fn file_version(&self) -> u16 {
        self.header.file_version
    }

    #[inline]
    pub fn header_size(&self) -> usize {
        self.header.header_size
    }

    /// Code page used for text, after any override.
    #[inline]
    pub fn code_page(&self) -> CodePage {
        self.code_page
    }

    #[inline]
    pub fn block_layout(&self) -> &BlockLayout {
        self.blocks.layout()
    }

    #[inline]
    pub fn blob_file(&self) -> Option<&BlobFile> {
        self.blobs.as_ref()
    }

    /// Block and in-block offset of record `record`.
    pub fn locate(&self, record: usize) -> Result<RecordLocation> {
        self.blocks.locate(record)
    }

    /// Undecoded bytes of record `record`.
    pub fn raw_record(&self, record: usize) -> Result<&[u8]> {
        let location = self.locate(record)?;
        Ok(bytes_at(&self.data, location.file_offset(), self.record_size())?)
    }

    /// Decode record `record`.
    ///
    /// Fields that fail to decode are reported inside the record; only
    /// record-level problems are errors.
    pub fn retrieve_record(&self, record: usize) -> Result<Record> {
        let raw = self.raw_record(record)?;
        let ctx = DecodeContext::new(self.code_page, self.blobs.as_ref());
        Ok(decode_record(raw, &self.schema.fields, &ctx))
    }

    /// Iterate over all records in order.
    pub fn records(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        (0..self.num_records()).map(move |n| self.retrieve_record(n))
    }

    /// Free a record and its payloads, returning the payload bytes released.
    pub fn release_record(&self, record: Record) -> usize {
        record.release()
    }

    /// Close the table, unmapping the file.
    pub fn close(self) {
        debug!("Closing table {:?}", self.schema.table_name);
    }
}

/// `NAME.MB` or `name.mb` next to the table, whichever exists.
fn find_blob_file(table: &Path) -> Option<PathBuf> {
    ["MB", "mb"]
        .into_iter()
        .map(|ext| table.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::BASE_HEADER_SIZE;
    use crate::testutil::{blob_value, live_bytes, BlobFileBuilder, TableBuilder};
    use crate::value::FieldValue;
    use pxdb_common::number::{encode_f64, encode_i16, encode_i32};

    fn people() -> TableBuilder {
        let mut builder = TableBuilder::new()
            .code_page(850)
            .table_name("personas")
            .field("Id", 0x16, 4)
            .field("Nombre", 0x01, 20)
            .field("Edad", 0x03, 2)
            .field("Saldo", 0x06, 8)
            .field("Activo", 0x09, 1);
        for i in 0..60i32 {
            let name = format!("persona {i}");
            builder = builder.record(&[
                &encode_i32(i + 1),
                name.as_bytes(),
                &encode_i16(20 + i as i16),
                &encode_f64(i as f64 * 1.5),
                &[if i % 2 == 0 { 0x81 } else { 0x80 }],
            ]);
        }
        builder
    }

    fn open(bytes: Vec<u8>) -> Document {
        Document::from_bytes(bytes, &OpenOptions::default()).unwrap()
    }

    #[test]
    fn test_accessors() {
        let doc = open(people().build());
        assert_eq!(doc.num_records(), 60);
        assert_eq!(doc.field_count(), 5);
        assert_eq!(doc.record_size(), 35);
        assert_eq!(doc.file_version(), 40);
        assert_eq!(doc.table_name(), "personas");
        assert_eq!(doc.code_page().id(), 850);
        assert_eq!(doc.fields()[1].name, "Nombre");
        assert!(doc.block_layout().is_contiguous());
        assert!(doc.path().is_none());
    }

    #[test]
    fn test_every_record_has_every_field() {
        let doc = open(people().build());
        for record in doc.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), doc.field_count());
            assert!(record.is_complete());
        }
    }

    #[test]
    fn test_retrieve_record_values() {
        let doc = open(people().build());
        // 1018 / 35 = 29 records per block, so record 45 is in block 2
        assert_eq!(doc.locate(45).unwrap().block_number, 2);

        let record = doc.retrieve_record(45).unwrap();
        assert_eq!(record.value(0), Some(&FieldValue::Integer(46)));
        assert_eq!(record.value(1).and_then(FieldValue::as_str), Some("persona 45"));
        assert_eq!(record.value(2), Some(&FieldValue::Integer(65)));
        assert_eq!(record.value(3), Some(&FieldValue::Float(67.5)));
        assert_eq!(record.value(4), Some(&FieldValue::Logical(false)));
    }

    #[test]
    fn test_retrieve_is_repeatable() {
        let doc = open(people().build());
        let first = doc.retrieve_record(7).unwrap();
        let second = doc.retrieve_record(7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_retrieve_nan_is_repeatable() {
        let bytes = TableBuilder::new()
            .field("Saldo", 0x06, 8)
            .record(&[&0xFFF8_0000_0000_0000u64.to_be_bytes()])
            .build();
        let doc = open(bytes);

        let first = doc.retrieve_record(0).unwrap();
        assert!(first.value(0).and_then(FieldValue::as_f64).is_some_and(f64::is_nan));
        assert_eq!(first, doc.retrieve_record(0).unwrap());
    }

    #[test]
    fn test_version_35_table() {
        let bytes = TableBuilder::new()
            .version_id(4)
            .code_page(850)
            .field("Nombre", 0x01, 10)
            .field("N", 0x03, 2)
            .record(&[b"Pe\xf1a", &encode_i16(5)])
            .build();
        let doc = open(bytes);

        assert_eq!(doc.file_version(), 35);
        assert_eq!(doc.header().descriptor_offset(), BASE_HEADER_SIZE);
        assert_eq!(doc.code_page().id(), 0);
        assert_eq!(doc.code_page().label(), "windows-1252");

        let names: Vec<&str> = doc.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Nombre", "N"]);

        let record = doc.retrieve_record(0).unwrap();
        assert_eq!(record.value(0).and_then(FieldValue::as_str), Some("Peña"));
        assert_eq!(record.value(1), Some(&FieldValue::Integer(5)));
    }

    #[test]
    fn test_out_of_range() {
        let doc = open(people().build());
        assert!(matches!(
            doc.retrieve_record(60),
            Err(Error::OutOfRange { record: 60, count: 60 })
        ));
        assert!(doc.retrieve_record(59).is_ok());
    }

    #[test]
    fn test_null_fields() {
        let bytes = TableBuilder::new()
            .field("Id", 0x04, 4)
            .field("Nombre", 0x01, 10)
            .record(&[&encode_i32(0)])
            .build();
        let doc = open(bytes);
        let record = doc.retrieve_record(0).unwrap();
        assert_eq!(record.value(0), Some(&FieldValue::Integer(0)));
        assert_eq!(record.value(1), Some(&FieldValue::Null));
    }

    #[test]
    fn test_record_size_mismatch() {
        let bytes = people().declared_record_size(40).build();

        let strict = Document::from_bytes(bytes.clone(), &OpenOptions::new().strict(true));
        assert!(matches!(
            strict,
            Err(Error::SchemaInconsistency { declared: 40, computed: 35 })
        ));

        let lenient = open(bytes);
        assert_eq!(lenient.record_size(), 35);
        assert_eq!(lenient.header().record_size, 40);
        let record = lenient.retrieve_record(30).unwrap();
        assert_eq!(record.value(0), Some(&FieldValue::Integer(31)));
    }

    #[test]
    fn test_schema_wider_than_records() {
        let mut bytes = people().build();
        // Nombre widened from 20 to 30 bytes, header still says 35
        bytes[0x78 + 3] = 30;

        let strict = Document::from_bytes(bytes.clone(), &OpenOptions::new().strict(true));
        assert!(matches!(
            strict,
            Err(Error::SchemaInconsistency { declared: 35, computed: 45 })
        ));

        let lenient = open(bytes);
        assert_eq!(lenient.record_size(), 45);
        match lenient.retrieve_record(0) {
            Err(Error::UnsupportedLayout(reason)) => {
                assert!(reason.contains("header declares 35-byte records but fields sum to 45"))
            }
            other => panic!("expected UnsupportedLayout, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_file() {
        let bytes = people().build();
        let cut = bytes[..0x30].to_vec();
        assert!(matches!(
            Document::from_bytes(cut, &OpenOptions::default()),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_fragmented_chain() {
        let mut bytes = people().build();
        let header = parse_header(&bytes).unwrap();
        let second = header.block_offset(2);
        // block 2 no longer links back to block 1
        bytes[second + 2..second + 4].copy_from_slice(&7u16.to_le_bytes());

        let doc = open(bytes);
        assert!(matches!(doc.block_layout(), BlockLayout::Fragmented { .. }));
        assert!(matches!(doc.retrieve_record(0), Err(Error::UnsupportedLayout(_))));
    }

    #[test]
    fn test_code_page_override() {
        let bytes = TableBuilder::new()
            .code_page(850)
            .field("Nombre", 0x01, 8)
            .record(&[b"Pe\xf1a"])
            .build();

        let doc = open(bytes.clone());
        assert_eq!(
            doc.retrieve_record(0).unwrap().value(0).and_then(FieldValue::as_str),
            Some("Pe±a")
        );

        let doc = Document::from_bytes(bytes, &OpenOptions::new().code_page_override(1252)).unwrap();
        assert_eq!(
            doc.retrieve_record(0).unwrap().value(0).and_then(FieldValue::as_str),
            Some("Peña")
        );
    }

    #[test]
    fn test_blob_fields() {
        let mut mb = BlobFileBuilder::new();
        let single = mb.single(&[0xAB; 700], 1);
        let slots = mb.suballocated(&[(b"memo en un slot del bloque", 2)]);

        let inline = pxdb_blob::BlobRef {
            offset: 0,
            index: 0,
            length: 4,
            modification: 0,
        };

        let bytes = TableBuilder::new()
            .field("Notas", 0x0C, 20)
            .field("Foto", 0x10, 10)
            .record(&[&blob_value(20, b"hola", &inline), &blob_value(10, b"", &single)])
            .record(&[&blob_value(20, b"memo en un", &slots[0])])
            .build();

        let doc = open(bytes).with_blob_file(BlobFile::from_bytes(mb.build()).unwrap());

        let first = doc.retrieve_record(0).unwrap();
        assert_eq!(first.value(0), Some(&FieldValue::Text("hola".into())));
        assert_eq!(first.value(1), Some(&FieldValue::Bytes(vec![0xAB; 700])));

        let second = doc.retrieve_record(1).unwrap();
        assert_eq!(
            second.value(0).and_then(FieldValue::as_str),
            Some("memo en un slot del bloque")
        );
        assert_eq!(second.value(1), Some(&FieldValue::Null));
    }

    #[test]
    fn test_blob_without_companion() {
        let mut mb = BlobFileBuilder::new();
        let single = mb.single(b"contenido externo del memo", 1);
        let bytes = TableBuilder::new()
            .field("Notas", 0x0C, 12)
            .record(&[&blob_value(12, b"co", &single)])
            .build();

        let doc = open(bytes);
        let record = doc.retrieve_record(0).unwrap();
        assert_eq!(record.value(0), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn test_open_finds_companion() {
        let dir = tempfile::tempdir().unwrap();
        let mut mb = BlobFileBuilder::new();
        let single = mb.single(b"texto guardado en el archivo MB", 5);
        let bytes = TableBuilder::new()
            .field("Notas", 0x0C, 11)
            .record(&[&blob_value(11, b"t", &single)])
            .build();

        let table = dir.path().join("NOTAS.DB");
        std::fs::write(&table, bytes).unwrap();
        std::fs::write(dir.path().join("NOTAS.MB"), mb.build()).unwrap();

        let doc = Document::open(&table).unwrap();
        assert_eq!(doc.path(), Some(table.as_path()));
        assert!(doc.blob_file().is_some());
        assert_eq!(
            doc.retrieve_record(0).unwrap().value(0).and_then(FieldValue::as_str),
            Some("texto guardado en el archivo MB")
        );
        doc.close();

        let doc = Document::open_with(&table, &OpenOptions::new().no_blob_file()).unwrap();
        assert!(doc.blob_file().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("NADA.DB");
        assert!(matches!(Document::open(&missing), Err(Error::Open { .. })));
    }

    #[test]
    fn test_release_frees_everything() {
        let doc = open(people().build());
        let before = live_bytes();
        let record = doc.retrieve_record(12).unwrap();
        assert!(live_bytes() > before);

        let released = doc.release_record(record);
        assert!(released >= "persona 12".len());
        assert_eq!(live_bytes(), before);

        let record = doc.retrieve_record(13).unwrap();
        drop(record);
        assert_eq!(live_bytes(), before);
    }
}
