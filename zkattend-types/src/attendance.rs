//! Attendance log records
//!
//! The record size depends on firmware generation:
//!
//! ```text
//!  8 bytes: uid u16 | status u8 | time u32 | punch u8
//! 16 bytes: user_id u32 | time u32 | status u8 | punch u8 | reserved [2] | workcode u32
//! 40 bytes: uid u16 | user_id [24] | status u8 | time u32 | punch u8 | reserved [8]
//! ```
//!
//! The 8-byte layout carries only the slot number, so the user id is looked
//! up in the user directory.

use std::fmt;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::NaiveDateTime;

use crate::cursor::{read_text, record_area};
use crate::error::{Error, Result};
use crate::time;
use crate::user::DeviceUser;

/// One punch as stored on the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    /// Slot number of the user (0 when the layout does not carry it)
    pub uid: u16,

    /// User id stamped on the punch
    pub user_id: String,

    /// Terminal wall-clock time, no zone attached
    pub timestamp: NaiveDateTime,

    /// Verification status byte
    pub status: u8,

    /// Punch type code (0 check-in, 1 check-out, 4/5 overtime in/out, ...)
    pub punch: u8,
}

impl fmt::Display for AttendanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Punch[{} @ {} punch={} status={}]",
            self.user_id, self.timestamp, self.punch, self.status
        )
    }
}

fn parse_compact(record: &[u8], users: &[DeviceUser]) -> Result<AttendanceRecord> {
    let mut cur = Cursor::new(record);
    let uid = cur.read_u16::<LittleEndian>()?;
    let status = cur.read_u8()?;
    let timestamp = time::decode(cur.read_u32::<LittleEndian>()?)?;
    let punch = cur.read_u8()?;

    let user_id = users
        .iter()
        .find(|u| u.uid == uid)
        .map(|u| u.user_id.clone())
        .unwrap_or_else(|| uid.to_string());

    Ok(AttendanceRecord {
        uid,
        user_id,
        timestamp,
        status,
        punch,
    })
}

fn parse_numeric(record: &[u8]) -> Result<AttendanceRecord> {
    let mut cur = Cursor::new(record);
    let user_id = cur.read_u32::<LittleEndian>()?.to_string();
    let timestamp = time::decode(cur.read_u32::<LittleEndian>()?)?;
    let status = cur.read_u8()?;
    let punch = cur.read_u8()?;

    Ok(AttendanceRecord {
        uid: 0,
        user_id,
        timestamp,
        status,
        punch,
    })
}

fn parse_extended(record: &[u8]) -> Result<AttendanceRecord> {
    let mut cur = Cursor::new(record);
    let uid = cur.read_u16::<LittleEndian>()?;
    let user_id = read_text(&mut cur, 24)?;
    let status = cur.read_u8()?;
    let timestamp = time::decode(cur.read_u32::<LittleEndian>()?)?;
    let punch = cur.read_u8()?;

    Ok(AttendanceRecord {
        uid,
        user_id,
        timestamp,
        status,
        punch,
    })
}

/// Parse the buffer returned by an attendance-log read.
///
/// `count` is the number of records from the capacity block, `users` the
/// directory used to resolve compact records.
pub fn parse_attendance(
    data: &[u8],
    count: usize,
    users: &[DeviceUser],
) -> Result<Vec<AttendanceRecord>> {
    let Some((records, size)) = record_area(data, count)? else {
        return Ok(Vec::new());
    };

    let chunks = records.chunks_exact(size);
    match size {
        8 => chunks.map(|r| parse_compact(r, users)).collect(),
        16 => chunks.map(parse_numeric).collect(),
        40 => chunks.map(parse_extended).collect(),
        other => Err(Error::Parse(format!(
            "unsupported attendance record size {}",
            other
        ))),
    }
}
