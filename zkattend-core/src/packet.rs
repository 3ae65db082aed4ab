//! ZKTeco protocol packet structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    error::{Error, Result},
};

/// ZKTeco protocol packet
///
/// # Packet Structure
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┬─────────────┬─────────────┐
/// │   Command   │  Checksum   │  SessionID  │  ReplyID    │   Payload   │
/// │   2 bytes   │   2 bytes   │   2 bytes   │   2 bytes   │   N bytes   │
/// └─────────────┴─────────────┴─────────────┴─────────────┴─────────────┘
/// ```
///
/// All multi-byte values are little-endian. Over TCP the packet is wrapped
/// in a [`FrameHeader`](crate::FrameHeader).
///
/// # Examples
///
/// ```
/// use zkattend_core::{Packet, Command};
///
/// let packet = Packet::new(Command::Connect, 0, 0);
/// let decoded = Packet::decode(packet.encode()).unwrap();
/// assert_eq!(decoded.command, Command::Connect);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command code
    pub command: Command,

    /// Session identifier (assigned by device on connect)
    pub session_id: u16,

    /// Reply number (increments per command in session)
    pub reply_id: u16,

    /// Command-specific data
    pub payload: Bytes,
}

impl Packet {
    /// Packet header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Maximum payload size
    pub const MAX_PAYLOAD_SIZE: usize = crate::MAX_PACKET_SIZE - Self::HEADER_SIZE;

    /// Create a new packet with empty payload
    pub fn new(command: Command, session_id: u16, reply_id: u16) -> Self {
        Self::with_payload(command, session_id, reply_id, Bytes::new())
    }

    /// Create a packet with payload
    pub fn with_payload(
        command: Command,
        session_id: u16,
        reply_id: u16,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            command,
            session_id,
            reply_id,
            payload: payload.into(),
        }
    }

    /// Checksum over header and payload
    pub fn checksum(&self) -> u16 {
        checksum::calculate(
            self.command.into(),
            self.session_id,
            self.reply_id,
            &self.payload,
        )
    }

    /// Encode packet to bytes (without any transport framing)
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16_le(self.command.into());
        buf.put_u16_le(self.checksum());
        buf.put_u16_le(self.session_id);
        buf.put_u16_le(self.reply_id);
        buf.put_slice(&self.payload);

        buf
    }

    /// Decode packet from bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is too short (< 8 bytes)
    /// - Command code is unknown
    /// - Checksum verification fails
    pub fn decode(mut buf: BytesMut) -> Result<Self> {
        if buf.len() < Self::HEADER_SIZE {
            return Err(Error::PacketTooShort {
                expected: Self::HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let command_raw = buf.get_u16_le();
        let received = buf.get_u16_le();
        let session_id = buf.get_u16_le();
        let reply_id = buf.get_u16_le();

        let command = Command::try_from(command_raw)?;

        let packet = Self {
            command,
            session_id,
            reply_id,
            payload: buf.freeze(),
        };

        let expected = packet.checksum();
        if expected != received {
            return Err(Error::ChecksumMismatch { expected, received });
        }

        Ok(packet)
    }

    /// Check if this is a success response
    pub fn is_success(&self) -> bool {
        self.command.is_success()
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        self.command.is_error()
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview = &self.payload[..self.payload.len().min(16)];
        f.debug_struct("Packet")
            .field("command", &self.command)
            .field("session_id", &format!("0x{:04X}", self.session_id))
            .field("reply_id", &format!("0x{:04X}", self.reply_id))
            .field("payload_len", &self.payload.len())
            .field("payload_head", &hex::encode(preview))
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](session={}, reply={}, len={})",
            self.command,
            self.session_id,
            self.reply_id,
            self.payload.len()
        )
    }
}
