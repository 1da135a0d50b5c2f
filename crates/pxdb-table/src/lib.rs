//! Paradox `.DB` table reader.
//!
//! Opening a table parses the fixed header, the field descriptors and names,
//! and walks the block chain once. Records are then decoded on demand into
//! typed [`FieldValue`]s; fields that cannot be decoded are reported on the
//! [`Record`] without failing the whole retrieval.
//!
//! # Example
//!
//! ```no_run
//! use pxdb_table::{Document, OpenOptions};
//!
//! let doc = Document::open_with("PATIENTS.DB", &OpenOptions::new().strict(true))?;
//! for field in doc.fields() {
//!     println!("{} {} ({} bytes)", field.name, field.field_type, field.length);
//! }
//! for record in doc.records() {
//!     let record = record?;
//!     for entry in &record {
//!         match entry {
//!             Ok(value) => print!("{value}\t"),
//!             Err(err) => print!("<{err}>\t"),
//!         }
//!     }
//!     println!();
//! }
//! # Ok::<(), pxdb_table::Error>(())
//! ```

mod block;
mod decoder;
mod document;
mod error;
mod field;
mod header;
mod options;
mod record;
mod schema;
mod value;

pub mod api;

#[cfg(test)]
mod testutil;

pub use block::{BlockIndex, BlockLayout, RecordLocation, BLOCK_HEADER_SIZE};
pub use decoder::{decode_field, decode_record, DecodeContext};
pub use document::Document;
pub use error::{Error, Result};
pub use field::{FieldDescriptor, FieldType};
pub use header::{parse_header, FileType, Header, BASE_HEADER_SIZE, DATA_HEADER_SIZE};
pub use options::{BlobSource, OpenOptions};
pub use record::Record;
pub use schema::{parse_fields, Schema};
pub use value::{DecodeError, DecodeReason, FieldValue, Hex};
