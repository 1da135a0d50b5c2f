//! pxdb - Paradox database file reading library.
//!
//! This crate provides a unified interface to the pxdb crates:
//!
//! # Crates
//!
//! - [`pxdb_common`] - Binary reading, Paradox numeric codecs, calendar, code pages
//! - [`pxdb_blob`] - Companion `.MB` blob file reading
//! - [`pxdb_table`] - `.DB` table header, schema, block index and records
//!
//! # Example
//!
//! ```no_run
//! use pxdb::prelude::*;
//!
//! let doc = Document::open("PATIENTS.DB")?;
//! println!("{} records of {} bytes", doc.num_records(), doc.record_size());
//!
//! let record = doc.retrieve_record(0)?;
//! if let Some(FieldValue::Text(name)) = record.value(1) {
//!     println!("first name: {name}");
//! }
//! doc.release_record(record);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use pxdb_blob as blob;
pub use pxdb_common as common;
pub use pxdb_table as table;

pub use pxdb_table::api;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pxdb_blob::{BlobFile, BlobRef};
    pub use pxdb_common::{CodePage, Date, Decimal, Time, Timestamp};
    pub use pxdb_table::{
        BlockLayout, DecodeError, DecodeReason, Document, FieldDescriptor, FieldType, FieldValue,
        OpenOptions, Record,
    };
}

pub use pxdb_table::{Document, Error, OpenOptions, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
