//! Record counts reported by `CMD_GET_FREE_SIZES`

use std::fmt;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Counts and capacities of the terminal's stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capacity {
    pub users: usize,
    pub fingers: usize,
    pub records: usize,
    pub cards: usize,
    pub users_cap: usize,
    pub fingers_cap: usize,
    pub records_cap: usize,
}

impl Capacity {
    /// Size of the fixed part of the reply: twenty `i32` fields
    pub const BLOCK_SIZE: usize = 80;

    /// Parse the reply payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::BLOCK_SIZE {
            return Err(Error::Parse(format!(
                "capacity block is {} bytes, need {}",
                payload.len(),
                Self::BLOCK_SIZE
            )));
        }

        let mut fields = [0i32; 20];
        Cursor::new(&payload[..Self::BLOCK_SIZE]).read_i32_into::<LittleEndian>(&mut fields)?;

        let count = |i: usize| fields[i].max(0) as usize;
        Ok(Self {
            users: count(4),
            fingers: count(6),
            records: count(8),
            cards: count(12),
            fingers_cap: count(14),
            users_cap: count(15),
            records_cap: count(16),
        })
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users {}/{}, fingers {}/{}, records {}/{}",
            self.users,
            self.users_cap,
            self.fingers,
            self.fingers_cap,
            self.records,
            self.records_cap
        )
    }
}
