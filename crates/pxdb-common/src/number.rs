//! Paradox numeric encodings.
//!
//! Record payloads store numbers big-endian with the sign bit inverted, so
//! that an unsigned byte-wise comparison orders them correctly. An all-zero
//! field is the NULL marker, which is why every decoder here returns
//! `Option`: `None` is NULL, never zero.
//!
//! - Integers: two's complement with the high bit flipped.
//! - Floats: IEEE-754; positive values have the sign bit flipped, negative
//!   values have every bit flipped.
//! - BCD: 17 bytes, a sign/precision byte followed by 32 digit nibbles.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::{Error, Result};

/// Width in bytes of a stored BCD value, independent of its precision.
pub const BCD_WIDTH: usize = 17;

/// Number of digit nibbles in a BCD value.
pub const BCD_DIGITS: usize = 32;

const SIGN16: u16 = 0x8000;
const SIGN32: u32 = 0x8000_0000;
const SIGN64: u64 = 0x8000_0000_0000_0000;

#[inline]
fn check_width(kind: &'static str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(Error::InvalidWidth {
            kind,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// True when every byte is zero, i.e. the field holds the NULL marker.
#[inline]
pub fn is_null_pattern(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

/// Decode a 2-byte Paradox short.
pub fn decode_i16(bytes: &[u8]) -> Result<Option<i16>> {
    check_width("short", bytes, 2)?;
    if is_null_pattern(bytes) {
        return Ok(None);
    }
    Ok(Some((BigEndian::read_u16(bytes) ^ SIGN16) as i16))
}

/// Decode a 4-byte Paradox long (also used for dates, times and
/// auto-increment values).
pub fn decode_i32(bytes: &[u8]) -> Result<Option<i32>> {
    check_width("long", bytes, 4)?;
    if is_null_pattern(bytes) {
        return Ok(None);
    }
    Ok(Some((BigEndian::read_u32(bytes) ^ SIGN32) as i32))
}

/// Decode an 8-byte Paradox number, currency or timestamp.
pub fn decode_f64(bytes: &[u8]) -> Result<Option<f64>> {
    check_width("number", bytes, 8)?;
    let raw = BigEndian::read_u64(bytes);
    if raw == 0 {
        return Ok(None);
    }
    let bits = if raw & SIGN64 != 0 { raw ^ SIGN64 } else { !raw };
    Ok(Some(f64::from_bits(bits)))
}

/// Decode a 1-byte Paradox logical.
pub fn decode_logical(bytes: &[u8]) -> Result<Option<bool>> {
    check_width("logical", bytes, 1)?;
    match bytes[0] {
        0 => Ok(None),
        b => Ok(Some(b ^ 0x80 != 0)),
    }
}

/// Encode a short in the stored form.
pub fn encode_i16(value: i16) -> [u8; 2] {
    ((value as u16) ^ SIGN16).to_be_bytes()
}

/// Encode a long in the stored form.
pub fn encode_i32(value: i32) -> [u8; 4] {
    ((value as u32) ^ SIGN32).to_be_bytes()
}

/// Encode a number in the stored form.
pub fn encode_f64(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let stored = if bits & SIGN64 != 0 { !bits } else { bits ^ SIGN64 };
    stored.to_be_bytes()
}

/// A fixed-point decimal decoded from a BCD field.
///
/// The value is `mantissa / 10^scale`. 32 digits always fit in an `i128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    /// Create a decimal from its unscaled mantissa and scale.
    #[inline]
    pub const fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }
    }

    /// The unscaled integer value.
    #[inline]
    pub const fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Number of digits after the decimal point.
    #[inline]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Lossy conversion to a float.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() <= scale {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        } else {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[inline]
fn nibble(bytes: &[u8], index: usize) -> u8 {
    let byte = bytes[index / 2];
    if index % 2 == 0 {
        byte >> 4
    } else {
        byte & 0x0F
    }
}

/// Decode a 17-byte BCD field with `decimals` fractional digits.
///
/// Bit 7 of the first byte is set for positive values; negative values store
/// every digit nibble inverted (XOR 0x0F).
pub fn decode_bcd(bytes: &[u8], decimals: u8) -> Result<Option<Decimal>> {
    check_width("BCD", bytes, BCD_WIDTH)?;
    if is_null_pattern(bytes) {
        return Ok(None);
    }

    let negative = bytes[0] & 0x80 == 0;
    let xor = if negative { 0x0F } else { 0x00 };

    let mut mantissa: i128 = 0;
    for index in 2..2 + BCD_DIGITS {
        let digit = nibble(bytes, index) ^ xor;
        if digit > 9 {
            return Err(Error::InvalidBcdDigit(digit));
        }
        mantissa = mantissa * 10 + digit as i128;
    }

    if negative {
        mantissa = -mantissa;
    }
    Ok(Some(Decimal::new(mantissa, decimals.min(BCD_DIGITS as u8))))
}

/// Encode a decimal in the stored BCD form.
pub fn encode_bcd(value: Decimal) -> [u8; BCD_WIDTH] {
    let mut out = [0u8; BCD_WIDTH];
    let negative = value.mantissa < 0;
    out[0] = (if negative { 0x00 } else { 0x80 }) | (value.scale & 0x3F);

    let xor = if negative { 0x0F } else { 0x00 };
    let mut rest = value.mantissa.unsigned_abs();
    for index in (2..2 + BCD_DIGITS).rev() {
        let digit = (rest % 10) as u8 ^ xor;
        rest /= 10;
        let byte = &mut out[index / 2];
        if index % 2 == 0 {
            *byte |= digit << 4;
        } else {
            *byte |= digit;
        }
    }
    out
}
