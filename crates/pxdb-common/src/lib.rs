//! Common utilities for pxdb.
//!
//! This crate provides the primitive decoding layer shared by the pxdb crates:
//!
//! - [`BinaryReader`] - Zero-copy, endian-aware reading from byte slices
//! - [`number`] - Paradox sign-flipped integers, floats and packed BCD
//! - [`calendar`] - Date, time and timestamp conversion
//! - [`CodePage`] - DOS/Windows code page text decoding
//! - [`FileBuffer`] - Memory-mapped or owned file contents

mod buffer;
mod error;
mod reader;

pub mod calendar;
pub mod codepage;
pub mod number;

pub use buffer::FileBuffer;
pub use calendar::{Date, Time, Timestamp};
pub use codepage::CodePage;
pub use error::{Error, Result};
pub use number::Decimal;
pub use reader::{bytes_at, trim_nul, BinaryReader};
