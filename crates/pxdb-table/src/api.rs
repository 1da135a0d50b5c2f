//! Handle-style functions for callers that hold an optional document.
//!
//! Every function accepts `None` and returns a neutral value (zero, an
//! empty slice or [`Error::NoDocument`]) instead of panicking.

use std::path::Path;

use crate::field::FieldDescriptor;
use crate::record::Record;
use crate::{Document, Error, Result};

/// Open a table with default options.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Document> {
    Document::open(path)
}

/// Close a document. Does nothing for `None`.
pub fn close(doc: Option<Document>) {
    if let Some(doc) = doc {
        doc.close();
    }
}

pub fn num_records(doc: Option<&Document>) -> usize {
    doc.map_or(0, Document::num_records)
}

pub fn field_count(doc: Option<&Document>) -> usize {
    doc.map_or(0, Document::field_count)
}

pub fn fields(doc: Option<&Document>) -> &[FieldDescriptor] {
    doc.map(Document::fields).unwrap_or_default()
}

/// Bytes per raw record.
pub fn record_size(doc: Option<&Document>) -> usize {
    doc.map_or(0, Document::record_size)
}

pub fn file_version(doc: Option<&Document>) -> u16 {
    doc.map_or(0, Document::file_version)
}

pub fn header_size(doc: Option<&Document>) -> usize {
    doc.map_or(0, Document::header_size)
}

/// Code page number in effect, 0 when unknown.
pub fn code_page(doc: Option<&Document>) -> u16 {
    doc.map_or(0, |d| d.code_page().id())
}

/// Decode record `record`; negative numbers are out of range.
pub fn retrieve_record(doc: Option<&Document>, record: i64) -> Result<Record> {
    let doc = doc.ok_or(Error::NoDocument)?;
    let index = usize::try_from(record).map_err(|_| Error::OutOfRange {
        record,
        count: doc.num_records(),
    })?;
    doc.retrieve_record(index).map_err(|e| match e {
        Error::OutOfRange { count, .. } => Error::OutOfRange { record, count },
        other => other,
    })
}

/// Release a record, returning the payload bytes freed. Does nothing for `None`.
pub fn release_record(doc: Option<&Document>, record: Option<Record>) -> usize {
    match (doc, record) {
        (Some(doc), Some(record)) => doc.release_record(record),
        (None, Some(record)) => record.release(),
        _ => 0,
    }
}
