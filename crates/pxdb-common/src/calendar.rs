//! Calendar types for Paradox date, time and timestamp fields.
//!
//! Dates count days with day 1 = 0001-01-01 in the proleptic Gregorian
//! calendar (Julian Day Number = days + 1721425). Times count milliseconds
//! since midnight. Timestamps are milliseconds since the same epoch as dates.

use std::fmt;

use crate::{Error, Result};

/// Paradox day number of 1970-01-01.
const UNIX_EPOCH_DAYS: i64 = 719_163;

/// Offset from a Paradox day number to the Julian Day Number.
pub const JULIAN_DAY_OFFSET: i64 = 1_721_425;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: u32 = 86_400_000;

/// A calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: i32,
    month: u8,
    day: u8,
}

impl Date {
    /// Construct from year, month (1-12) and day (1-31) without validation of
    /// the day against the month length.
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(Error::CalendarRange("date"));
        }
        Ok(Self { year, month, day })
    }

    /// Convert a Paradox day number.
    pub fn from_days(days: i32) -> Self {
        let mut z = days as i64 - UNIX_EPOCH_DAYS + 719_468;
        let era = if z >= 0 { z / 146_097 } else { (z - 146_096) / 146_097 };
        z -= era * 146_097;
        let doe = z as u32;
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = yoe as i64 + era * 400 + i64::from(month <= 2);
        Self {
            year: year as i32,
            month: month as u8,
            day: day as u8,
        }
    }

    /// The Paradox day number of this date.
    pub fn to_days(&self) -> i32 {
        let year = self.year as i64 - i64::from(self.month <= 2);
        let era = (if year >= 0 { year } else { year - 399 }) / 400;
        let yoe = year - era * 400;
        let month = self.month as i64;
        let mp = if month > 2 { month - 3 } else { month + 9 };
        let doy = (153 * mp + 2) / 5 + self.day as i64 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        (era * 146_097 + doe - 719_468 + UNIX_EPOCH_DAYS) as i32
    }

    /// Julian Day Number of this date.
    pub fn julian_day(&self) -> i64 {
        self.to_days() as i64 + JULIAN_DAY_OFFSET
    }

    #[inline]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[inline]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[inline]
    pub const fn day(&self) -> u8 {
        self.day
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A time of day with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    millis: u32,
}

impl Time {
    /// Convert milliseconds since midnight.
    pub fn from_millis(millis: i64) -> Result<Self> {
        if !(0..MILLIS_PER_DAY as i64).contains(&millis) {
            return Err(Error::CalendarRange("time"));
        }
        Ok(Self {
            millis: millis as u32,
        })
    }

    #[inline]
    pub const fn millis_since_midnight(&self) -> u32 {
        self.millis
    }

    #[inline]
    pub const fn hour(&self) -> u32 {
        self.millis / 3_600_000
    }

    #[inline]
    pub const fn minute(&self) -> u32 {
        self.millis / 60_000 % 60
    }

    #[inline]
    pub const fn second(&self) -> u32 {
        self.millis / 1000 % 60
    }

    #[inline]
    pub const fn millisecond(&self) -> u32 {
        self.millis % 1000
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())?;
        if self.millisecond() != 0 {
            write!(f, ".{:03}", self.millisecond())?;
        }
        Ok(())
    }
}

/// A date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    date: Date,
    time: Time,
}

impl Timestamp {
    pub const fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    /// Convert a stored timestamp (milliseconds since the date epoch).
    pub fn from_millis(millis: f64) -> Result<Self> {
        if !millis.is_finite() {
            return Err(Error::CalendarRange("timestamp"));
        }
        let millis = millis.round() as i64;
        let per_day = MILLIS_PER_DAY as i64;
        let days = millis.div_euclid(per_day);
        if days < i32::MIN as i64 || days > i32::MAX as i64 {
            return Err(Error::CalendarRange("timestamp"));
        }
        Ok(Self {
            date: Date::from_days(days as i32),
            time: Time::from_millis(millis.rem_euclid(per_day))?,
        })
    }

    /// Milliseconds since the date epoch, the stored representation.
    pub fn to_millis(&self) -> f64 {
        self.date.to_days() as f64 * MILLIS_PER_DAY as f64 + self.time.millis as f64
    }

    #[inline]
    pub const fn date(&self) -> Date {
        self.date
    }

    #[inline]
    pub const fn time(&self) -> Time {
        self.time
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{Date, Time, Timestamp};

    macro_rules! serialize_display {
        ($ty:ty) => {
            impl serde::Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.collect_str(self)
                }
            }
        };
    }

    serialize_display!(Date);
    serialize_display!(Time);
    serialize_display!(Timestamp);
}
