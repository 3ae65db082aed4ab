//! Enrolled users
//!
//! Terminals answer a user-directory read with either 28-byte (older
//! firmware) or 72-byte records. Both layouts are little-endian.
//!
//! ```text
//! 28 bytes: uid u16 | privilege u8 | password [5] | name [8] | card u32 | pad | group u8 | tz i16 | user_id u32
//! 72 bytes: uid u16 | privilege u8 | password [8] | name [24] | card u32 | pad | group [7] | pad | user_id [24]
//! ```

use std::fmt;
use std::io::Cursor;

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::cursor::{read_text, record_area, skip};
use crate::error::{Error, Result};

bitflags! {
    /// Privilege byte of a user record
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Privilege: u8 {
        const DISABLED = 0b0000_0001;
        const ENROLLER = 0b0000_0010;
        const MANAGER = 0b0000_0110;
        const ADMIN = 0b0000_1110;
    }
}

/// A user enrolled on the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUser {
    /// Internal slot number on the terminal
    pub uid: u16,

    /// User id shown on the terminal and stamped on punches
    pub user_id: String,

    /// Display name, `NN-<user_id>` when left blank on the terminal
    pub name: String,

    pub privilege: Privilege,
    pub password: String,
    pub group_id: String,
    pub card: u32,
}

impl DeviceUser {
    pub fn is_disabled(&self) -> bool {
        self.privilege.contains(Privilege::DISABLED)
    }

    fn fallback_name(name: String, user_id: &str) -> String {
        if name.is_empty() {
            format!("NN-{}", user_id)
        } else {
            name
        }
    }

    fn parse_short(record: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(record);
        let uid = cur.read_u16::<LittleEndian>()?;
        let privilege = Privilege::from_bits_retain(cur.read_u8()?);
        let password = read_text(&mut cur, 5)?;
        let name = read_text(&mut cur, 8)?;
        let card = cur.read_u32::<LittleEndian>()?;
        skip(&mut cur, 1);
        let group_id = cur.read_u8()?.to_string();
        let _timezone = cur.read_i16::<LittleEndian>()?;
        let user_id = cur.read_u32::<LittleEndian>()?.to_string();

        Ok(Self {
            uid,
            name: Self::fallback_name(name, &user_id),
            user_id,
            privilege,
            password,
            group_id,
            card,
        })
    }

    fn parse_long(record: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(record);
        let uid = cur.read_u16::<LittleEndian>()?;
        let privilege = Privilege::from_bits_retain(cur.read_u8()?);
        let password = read_text(&mut cur, 8)?;
        let name = read_text(&mut cur, 24)?;
        let card = cur.read_u32::<LittleEndian>()?;
        skip(&mut cur, 1);
        let group_id = read_text(&mut cur, 7)?;
        skip(&mut cur, 1);
        let user_id = read_text(&mut cur, 24)?;

        Ok(Self {
            uid,
            name: Self::fallback_name(name, &user_id),
            user_id,
            privilege,
            password,
            group_id,
            card,
        })
    }
}

impl fmt::Display for DeviceUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User[{}: {}]", self.user_id, self.name)
    }
}

/// Parse the buffer returned by a user-directory read.
///
/// `count` is the number of users the terminal reported in its capacity
/// block; it fixes the record size.
pub fn parse_users(data: &[u8], count: usize) -> Result<Vec<DeviceUser>> {
    let Some((records, size)) = record_area(data, count)? else {
        return Ok(Vec::new());
    };

    let parse: fn(&[u8]) -> Result<DeviceUser> = match size {
        28 => DeviceUser::parse_short,
        72 => DeviceUser::parse_long,
        other => {
            return Err(Error::Parse(format!("unsupported user record size {}", other)));
        }
    };

    records.chunks_exact(size).map(parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn long_record(uid: u16, user_id: &str, name: &str) -> Vec<u8> {
        let mut rec = Vec::with_capacity(72);
        rec.extend_from_slice(&uid.to_le_bytes());
        rec.push(0);
        rec.extend_from_slice(&[0u8; 8]);
        let mut n = [0u8; 24];
        n[..name.len()].copy_from_slice(name.as_bytes());
        rec.extend_from_slice(&n);
        rec.extend_from_slice(&0u32.to_le_bytes());
        rec.push(0);
        rec.extend_from_slice(b"1\0\0\0\0\0\0");
        rec.push(0);
        let mut id = [0u8; 24];
        id[..user_id.len()].copy_from_slice(user_id.as_bytes());
        rec.extend_from_slice(&id);
        rec
    }

    fn with_size_prefix(records: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = records.concat();
        let mut data = (body.len() as u32).to_le_bytes().to_vec();
        data.extend_from_slice(&body);
        data
    }

    #[test]
    fn test_parse_long_records() {
        let data = with_size_prefix(&[long_record(1, "1001", "Alice"), long_record(2, "1002", "")]);
        let users = parse_users(&data, 2).unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "1001");
        assert_eq!(users[0].name, "Alice");
        assert_eq!(users[0].group_id, "1");
        assert_eq!(users[1].name, "NN-1002");
    }

    #[test]
    fn test_parse_short_record() {
        let mut rec = Vec::new();
        rec.extend_from_slice(&3u16.to_le_bytes());
        rec.push(Privilege::ADMIN.bits() | Privilege::DISABLED.bits());
        rec.extend_from_slice(b"12\0\0\0");
        rec.extend_from_slice(b"Bob\0\0\0\0\0");
        rec.extend_from_slice(&77u32.to_le_bytes());
        rec.push(0);
        rec.push(4);
        rec.extend_from_slice(&1i16.to_le_bytes());
        rec.extend_from_slice(&42u32.to_le_bytes());
        assert_eq!(rec.len(), 28);

        let users = parse_users(&with_size_prefix(&[rec]), 1).unwrap();
        let bob = &users[0];
        assert_eq!(bob.uid, 3);
        assert_eq!(bob.user_id, "42");
        assert_eq!(bob.name, "Bob");
        assert_eq!(bob.password, "12");
        assert_eq!(bob.card, 77);
        assert_eq!(bob.group_id, "4");
        assert!(bob.is_disabled());
        assert!(bob.privilege.contains(Privilege::ADMIN));
    }

    #[test]
    fn test_empty_directory() {
        assert!(parse_users(&[], 0).unwrap().is_empty());
        assert!(parse_users(&[0, 0, 0, 0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_record_size() {
        let data = with_size_prefix(&[vec![0u8; 30]]);
        assert!(matches!(parse_users(&data, 1), Err(Error::Parse(_))));
    }
}
