//! Data block chain and record location.
//!
//! Records live in fixed-size blocks after the header. Each block starts
//! with a 6-byte header linking it to its neighbours and telling how many
//! records it holds. The chain is walked once at open; locating a record is
//! then plain arithmetic.

use log::trace;
use zerocopy::byteorder::little_endian::{I16, U16};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use pxdb_common::BinaryReader;

use crate::header::Header;
use crate::{Error, Result};

/// Size of the header at the start of every data block.
pub const BLOCK_HEADER_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
struct RawBlockHeader {
    next_block: U16,
    prev_block: U16,
    /// Offset of the last record in the block, negative when empty.
    add_data_size: I16,
}

impl RawBlockHeader {
    fn record_count(&self, record_size: usize) -> usize {
        match self.add_data_size.get() {
            add if add < 0 => 0,
            add => add as usize / record_size + 1,
        }
    }
}

/// How the table's blocks are arranged on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLayout {
    /// No records.
    Empty,
    /// Blocks `first_block..first_block + blocks` in order, all full but the last.
    Contiguous { first_block: u16, blocks: usize },
    /// Any other arrangement; records cannot be located by arithmetic.
    Fragmented { reason: String },
}

impl BlockLayout {
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        matches!(self, Self::Contiguous { .. })
    }
}

/// Where a record lives in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    /// 1-based block number.
    pub block_number: u16,
    /// File offset of the block.
    pub block_offset: usize,
    /// Offset of the record within the block, past the block header.
    pub intra_block_offset: usize,
}

impl RecordLocation {
    /// Absolute file offset of the record.
    #[inline]
    pub const fn file_offset(&self) -> usize {
        self.block_offset + self.intra_block_offset
    }
}

/// Precomputed block geometry for a table.
#[derive(Debug, Clone)]
pub struct BlockIndex {
    layout: BlockLayout,
    header_size: usize,
    block_size: usize,
    record_size: usize,
    records_per_block: usize,
    num_records: usize,
}

impl BlockIndex {
    /// Walk the block chain and classify its layout.
    pub fn build(data: &[u8], header: &Header, record_size: usize) -> Self {
        let records_per_block = if record_size == 0 {
            0
        } else {
            header.block_size.saturating_sub(BLOCK_HEADER_SIZE) / record_size
        };
        let mut layout = walk_chain(data, header, record_size, records_per_block);
        if let BlockLayout::Fragmented { reason } = &mut layout {
            if record_size != header.record_size {
                reason.push_str(&format!(
                    "; header declares {}-byte records but fields sum to {record_size}",
                    header.record_size
                ));
            }
        }
        trace!("Block layout: {layout:?} ({records_per_block} records per block)");

        Self {
            layout,
            header_size: header.header_size,
            block_size: header.block_size,
            record_size,
            records_per_block,
            num_records: header.num_records,
        }
    }

    #[inline]
    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    #[inline]
    pub const fn records_per_block(&self) -> usize {
        self.records_per_block
    }

    #[inline]
    pub const fn record_size(&self) -> usize {
        self.record_size
    }

    /// Find record `record` (0-based).
    pub fn locate(&self, record: usize) -> Result<RecordLocation> {
        if record >= self.num_records {
            return Err(Error::OutOfRange {
                record: record as i64,
                count: self.num_records,
            });
        }

        let first_block = match &self.layout {
            BlockLayout::Contiguous { first_block, .. } => *first_block,
            BlockLayout::Fragmented { reason } => {
                return Err(Error::UnsupportedLayout(reason.clone()))
            }
            BlockLayout::Empty => {
                return Err(Error::OutOfRange {
                    record: record as i64,
                    count: 0,
                })
            }
        };

        let block_index = record / self.records_per_block;
        let slot = record % self.records_per_block;
        // the walk guarantees every block of the chain fits in u16
        let block_number = first_block + block_index as u16;
        let location = RecordLocation {
            block_number,
            block_offset: self.header_size + (block_number as usize - 1) * self.block_size,
            intra_block_offset: BLOCK_HEADER_SIZE + slot * self.record_size,
        };
        trace!("Record {record} is in block {block_number} at {:#x}", location.file_offset());
        Ok(location)
    }
}

fn walk_chain(
    data: &[u8],
    header: &Header,
    record_size: usize,
    records_per_block: usize,
) -> BlockLayout {
    let fragmented = |reason: String| BlockLayout::Fragmented { reason };

    if header.num_records == 0 {
        return BlockLayout::Empty;
    }
    if records_per_block == 0 {
        return fragmented(format!(
            "{record_size}-byte records do not fit {}-byte blocks",
            header.block_size
        ));
    }
    if header.first_block == 0 {
        return fragmented("table has records but no first block".into());
    }

    let blocks_in_file = data.len().saturating_sub(header.header_size).div_ceil(header.block_size);

    let mut current = header.first_block;
    let mut previous = 0u16;
    let mut partial: Option<u16> = None;
    let mut blocks = 0usize;
    let mut total = 0usize;

    while current != 0 {
        if blocks >= blocks_in_file {
            return fragmented(format!("block chain runs past the {blocks_in_file} blocks in the file"));
        }
        let expected = header.first_block as usize + blocks;
        if current as usize != expected {
            return fragmented(format!(
                "block {current} follows block {previous}, expected {expected}"
            ));
        }
        if let Some(block) = partial {
            return fragmented(format!("block {block} is not full but is followed by block {current}"));
        }

        let offset = header.block_offset(current);
        let Ok(raw) = BinaryReader::new_at(data, offset).read_struct::<RawBlockHeader>() else {
            return fragmented(format!("block {current} lies past the end of the file"));
        };
        if raw.prev_block.get() != previous {
            return fragmented(format!(
                "block {current} links back to {}, expected {previous}",
                raw.prev_block.get()
            ));
        }

        let count = raw.record_count(record_size);
        if count > records_per_block {
            return fragmented(format!(
                "block {current} claims {count} records, capacity is {records_per_block}"
            ));
        }
        if offset + BLOCK_HEADER_SIZE + count * record_size > data.len() {
            return fragmented(format!("records of block {current} run past the end of the file"));
        }
        if count < records_per_block {
            partial = Some(current);
        }

        total += count;
        blocks += 1;
        previous = current;
        current = raw.next_block.get();
    }

    if total != header.num_records {
        return fragmented(format!(
            "block chain holds {total} records, header declares {}",
            header.num_records
        ));
    }

    BlockLayout::Contiguous {
        first_block: header.first_block,
        blocks,
    }
}
