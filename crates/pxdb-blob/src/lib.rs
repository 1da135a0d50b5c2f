//! Paradox companion blob file (`.MB`) reader.
//!
//! Memo, formatted memo, binary blob, OLE and graphic fields keep a short
//! inline prefix in the record and a 10-byte [`BlobRef`] trailer. Payloads
//! that do not fit inline live in the table's `.MB` file, which is organized
//! in 4 KiB blocks of three kinds:
//!
//! - type 0: file header block (always the first block)
//! - type 2: a single blob spanning one or more blocks
//! - type 3: a sub-allocated block with up to 64 small blobs addressed through
//!   a 5-byte-per-slot pointer table
//!
//! # Example
//!
//! ```no_run
//! use pxdb_blob::{BlobFile, BlobRef};
//!
//! let blobs = BlobFile::open("PATIENTS.MB")?;
//! let trailer = [0xFF, 0x10, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00];
//! let payload = blobs.read(&BlobRef::parse(&trailer)?)?;
//! println!("{} bytes", payload.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod file;
mod reference;

pub use error::{Error, Result};
pub use file::{BlobFile, BLOB_BLOCK_SIZE, SLOTS_PER_BLOCK};
pub use reference::{BlobRef, BLOB_REF_SIZE, SINGLE_BLOB_INDEX};
