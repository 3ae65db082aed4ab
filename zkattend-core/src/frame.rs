//! TCP framing
//!
//! Over TCP each packet is preceded by an 8-byte header: the two magic words
//! and the little-endian length of the packet that follows.
//!
//! ```text
//! ┌────────────┬────────────┬──────────────────┬──────────────┐
//! │   0x5050   │   0x7D82   │  length (u32 LE) │    packet    │
//! └────────────┴────────────┴──────────────────┴──────────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::constants::{TCP_MAGIC_1, TCP_MAGIC_2};
use crate::error::{Error, Result};
use crate::MAX_PACKET_SIZE;

/// Header that prefixes every packet on a TCP stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the packet following the header
    pub length: usize,
}

impl FrameHeader {
    /// Frame header size in bytes
    pub const SIZE: usize = 8;

    /// Wrap an encoded packet in a TCP frame
    pub fn wrap(packet: &[u8]) -> BytesMut {
        let mut buf = BytesMut::with_capacity(Self::SIZE + packet.len());
        buf.put_u16_le(TCP_MAGIC_1);
        buf.put_u16_le(TCP_MAGIC_2);
        buf.put_u32_le(packet.len() as u32);
        buf.put_slice(packet);
        buf
    }

    /// Parse the 8 header bytes read off the stream
    pub fn parse(mut header: &[u8]) -> Result<Self> {
        if header.len() < Self::SIZE {
            return Err(Error::PacketTooShort {
                expected: Self::SIZE,
                actual: header.len(),
            });
        }

        let first = header.get_u16_le();
        let second = header.get_u16_le();
        if first != TCP_MAGIC_1 || second != TCP_MAGIC_2 {
            return Err(Error::BadFrameMagic { first, second });
        }

        let length = header.get_u32_le() as usize;
        if length > MAX_PACKET_SIZE {
            return Err(Error::FrameTooLarge {
                size: length,
                max: MAX_PACKET_SIZE,
            });
        }

        Ok(Self { length })
    }
}
