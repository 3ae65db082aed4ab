//! Packed device clock
//!
//! Terminals store wall-clock time (no zone) as a single `u32` counting
//! seconds in a calendar where every month has 31 days and years start at
//! 2000.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Decode a packed device timestamp
pub fn decode(mut t: u32) -> Result<NaiveDateTime> {
    let second = t % 60;
    t /= 60;
    let minute = t % 60;
    t /= 60;
    let hour = t % 24;
    t /= 24;
    let day = t % 31 + 1;
    t /= 31;
    let month = t % 12 + 1;
    t /= 12;
    let year = t as i32 + 2000;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            Error::Parse(format!(
                "invalid device time {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        })
}

/// Encode a wall-clock time in the device format
///
/// Only the last two digits of the year survive, as on the terminal.
pub fn encode(t: &NaiveDateTime) -> u32 {
    let year = (t.year() % 100) as u32;
    let days = (year * 12 * 31) + (t.month0() * 31) + t.day0();
    days * 86_400 + (t.hour() * 60 + t.minute()) * 60 + t.second()
}
