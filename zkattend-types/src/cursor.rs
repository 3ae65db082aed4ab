//! Helpers for reading packed little-endian records

use std::io::{Cursor, Read};

use crate::error::{Error, Result};

/// Read a fixed-width, NUL-padded text field
pub(crate) fn read_text(cur: &mut Cursor<&[u8]>, width: usize) -> Result<String> {
    let mut raw = vec![0u8; width];
    cur.read_exact(&mut raw)?;
    let end = raw.iter().position(|b| *b == 0).unwrap_or(width);
    Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
}

/// Skip `n` padding bytes
pub(crate) fn skip(cur: &mut Cursor<&[u8]>, n: u64) {
    cur.set_position(cur.position() + n);
}

/// Split a bulk-read buffer into its record area and the per-record size.
///
/// Bulk reads start with a `u32` byte count for the records that follow; the
/// layout is inferred by dividing that count by the number of records the
/// terminal reported.
pub(crate) fn record_area(data: &[u8], count: usize) -> Result<Option<(&[u8], usize)>> {
    if count == 0 || data.len() <= 4 {
        return Ok(None);
    }

    let total = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if total == 0 {
        return Ok(None);
    }
    if total % count != 0 {
        return Err(Error::Parse(format!(
            "{} bytes do not divide into {} records",
            total, count
        )));
    }

    Ok(Some((&data[4..], total / count)))
}
