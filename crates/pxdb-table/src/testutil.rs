//! Synthetic table and blob file images for tests.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use pxdb_blob::{BlobRef, BLOB_BLOCK_SIZE, BLOB_REF_SIZE, SINGLE_BLOB_INDEX};

use crate::header::file_version_from_id;

/// Builds a `.DB` image: header, schema area padded to 2 KiB, then full
/// blocks of records in chain order.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    version_id: u8,
    file_type: u8,
    code_page: u16,
    block_kib: u8,
    encryption: u32,
    table_name: String,
    fields: Vec<(Vec<u8>, u8, u8)>,
    records: Vec<Vec<Vec<u8>>>,
    declared_record_size: Option<u16>,
    declared_records: Option<u32>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            version_id: 9,
            file_type: 0,
            code_page: 437,
            block_kib: 1,
            encryption: 0,
            table_name: "tabla".into(),
            fields: Vec::new(),
            records: Vec::new(),
            declared_record_size: None,
            declared_records: None,
        }
    }

    pub fn version_id(mut self, id: u8) -> Self {
        self.version_id = id;
        self
    }

    pub fn file_type(mut self, file_type: u8) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn code_page(mut self, code_page: u16) -> Self {
        self.code_page = code_page;
        self
    }

    pub fn block_kib(mut self, kib: u8) -> Self {
        self.block_kib = kib;
        self
    }

    pub fn encryption(mut self, encryption: u32) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn table_name(mut self, name: &str) -> Self {
        self.table_name = name.into();
        self
    }

    pub fn field(self, name: &str, tag: u8, size: u8) -> Self {
        self.field_raw_name(name.as_bytes(), tag, size)
    }

    pub fn field_raw_name(mut self, name: &[u8], tag: u8, size: u8) -> Self {
        self.fields.push((name.to_vec(), tag, size));
        self
    }

    /// Add a record; each part fills one field and is zero-padded to its width.
    pub fn record(mut self, parts: &[&[u8]]) -> Self {
        self.records.push(parts.iter().map(|p| p.to_vec()).collect());
        self
    }

    /// Write this record size into the header instead of the computed one.
    pub fn declared_record_size(mut self, size: u16) -> Self {
        self.declared_record_size = Some(size);
        self
    }

    /// Write this record count into the header instead of the real one.
    pub fn declared_records(mut self, count: u32) -> Self {
        self.declared_records = Some(count);
        self
    }

    fn widths(&self) -> Vec<usize> {
        self.fields
            .iter()
            .map(|&(_, tag, size)| if tag == 0x17 { 17 } else { size as usize })
            .collect()
    }

    pub fn build(self) -> Vec<u8> {
        let version = file_version_from_id(self.version_id).unwrap_or(40);
        let descriptor_offset = if version >= 40 { 0x78 } else { 0x58 };
        let name_size = if version >= 70 { 261 } else { 79 };

        let mut data = vec![0u8; descriptor_offset];
        for (_, tag, size) in &self.fields {
            data.push(*tag);
            data.push(*size);
        }
        data.extend(std::iter::repeat(0).take(4 + 4 * self.fields.len()));
        let mut name = vec![0u8; name_size];
        let len = self.table_name.len().min(name_size - 1);
        name[..len].copy_from_slice(&self.table_name.as_bytes()[..len]);
        data.extend_from_slice(&name);
        for (field_name, _, _) in &self.fields {
            data.extend_from_slice(field_name);
            data.push(0);
        }
        let header_size = data.len().next_multiple_of(0x800);
        data.resize(header_size, 0);

        let widths = self.widths();
        let stride: usize = widths.iter().sum();
        let block_size = self.block_kib as usize * 1024;
        let per_block = if stride == 0 { 1 } else { (block_size - 6) / stride };

        let mut rows = Vec::with_capacity(self.records.len());
        for parts in &self.records {
            let mut row = Vec::with_capacity(stride);
            for (i, width) in widths.iter().enumerate() {
                let mut cell = parts.get(i).cloned().unwrap_or_default();
                cell.resize(*width, 0);
                row.extend_from_slice(&cell);
            }
            rows.push(row);
        }

        let chunks: Vec<&[Vec<u8>]> = rows.chunks(per_block.max(1)).collect();
        let blocks = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            let start = data.len();
            data.resize(start + block_size, 0);
            let next = if i + 1 == blocks { 0 } else { i as u16 + 2 };
            let add = ((chunk.len() - 1) * stride) as i16;
            data[start..start + 2].copy_from_slice(&next.to_le_bytes());
            data[start + 2..start + 4].copy_from_slice(&(i as u16).to_le_bytes());
            data[start + 4..start + 6].copy_from_slice(&add.to_le_bytes());
            let mut offset = start + 6;
            for row in chunk.iter() {
                data[offset..offset + stride].copy_from_slice(row);
                offset += stride;
            }
        }

        let record_size = self.declared_record_size.unwrap_or(stride as u16);
        let num_records = self.declared_records.unwrap_or(self.records.len() as u32);
        let blocks = blocks as u16;

        put_u16(&mut data, 0x00, record_size);
        put_u16(&mut data, 0x02, header_size as u16);
        data[0x04] = self.file_type;
        data[0x05] = self.block_kib;
        data[0x06..0x0A].copy_from_slice(&num_records.to_le_bytes());
        put_u16(&mut data, 0x0A, blocks);
        put_u16(&mut data, 0x0C, blocks);
        put_u16(&mut data, 0x0E, if blocks > 0 { 1 } else { 0 });
        put_u16(&mut data, 0x10, blocks);
        put_u16(&mut data, 0x21, self.fields.len() as u16);
        data[0x39] = self.version_id;
        if version >= 40 {
            data[0x5C..0x60].copy_from_slice(&self.encryption.to_le_bytes());
            put_u16(&mut data, 0x6A, self.code_page);
        } else {
            data[0x25..0x29].copy_from_slice(&self.encryption.to_le_bytes());
        }
        data
    }
}

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Builds a `.MB` image starting with its header block.
#[derive(Debug, Clone)]
pub struct BlobFileBuilder {
    data: Vec<u8>,
}

impl BlobFileBuilder {
    pub fn new() -> Self {
        Self {
            data: vec![0u8; BLOB_BLOCK_SIZE],
        }
    }

    /// Append a single-blob block run holding `payload`.
    pub fn single(&mut self, payload: &[u8], modification: u16) -> BlobRef {
        let offset = self.data.len();
        let blocks = (9 + payload.len()).div_ceil(BLOB_BLOCK_SIZE);
        self.data.resize(offset + blocks * BLOB_BLOCK_SIZE, 0);

        let block = &mut self.data[offset..];
        block[0] = 2;
        block[1..3].copy_from_slice(&(blocks as u16).to_le_bytes());
        block[3..7].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        block[7..9].copy_from_slice(&modification.to_le_bytes());
        block[9..9 + payload.len()].copy_from_slice(payload);

        BlobRef {
            offset: offset as u32,
            index: SINGLE_BLOB_INDEX,
            length: payload.len() as u32,
            modification,
        }
    }

    /// Append a sub-allocated block with one slot per payload.
    pub fn suballocated(&mut self, payloads: &[(&[u8], u16)]) -> Vec<BlobRef> {
        let offset = self.data.len();
        self.data.resize(offset + BLOB_BLOCK_SIZE, 0);
        self.data[offset] = 3;

        let mut cursor = 0x150;
        let mut refs = Vec::with_capacity(payloads.len());
        for (index, (payload, modification)) in payloads.iter().enumerate() {
            let units = payload.len().div_ceil(16);
            let entry = offset + 12 + index * 5;
            self.data[entry] = (cursor / 16) as u8;
            self.data[entry + 1] = units as u8;
            self.data[entry + 2..entry + 4].copy_from_slice(&modification.to_le_bytes());
            self.data[entry + 4] = (payload.len() % 16) as u8;
            self.data[offset + cursor..offset + cursor + payload.len()].copy_from_slice(payload);
            cursor += units * 16;

            refs.push(BlobRef {
                offset: offset as u32,
                index: index as u8,
                length: payload.len() as u32,
                modification: *modification,
            });
        }
        refs
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Bytes of a blob-typed field: inline prefix, zero padding, reference trailer.
pub fn blob_value(width: usize, inline: &[u8], blob: &BlobRef) -> Vec<u8> {
    let mut value = vec![0u8; width];
    value[..inline.len()].copy_from_slice(inline);
    value[width - BLOB_REF_SIZE..].copy_from_slice(&blob.to_bytes());
    value
}

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

/// System allocator that tracks live heap bytes per thread.
pub struct CountingAlloc;

fn track(delta: isize) {
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            track(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        track(-(layout.size() as isize));
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

/// Heap bytes currently allocated by this thread.
pub fn live_bytes() -> isize {
    LIVE.with(Cell::get)
}
