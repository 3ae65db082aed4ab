//! Error types for zkattend-core

/// Result type alias for wire-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wire-level protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Packet is too short to be valid
    #[error("Packet too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort {
        expected: usize,
        actual: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// Unknown command code
    #[error("Unknown command code: {0}")]
    UnknownCommand(u16),

    /// TCP frame did not start with the protocol magic
    #[error("Bad frame magic: 0x{first:04X} 0x{second:04X}")]
    BadFrameMagic {
        first: u16,
        second: u16,
    },

    /// TCP frame announces more bytes than a packet may carry
    #[error("Frame too large: {size} bytes (max: {max} bytes)")]
    FrameTooLarge {
        size: usize,
        max: usize,
    },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Whether the bytes on the wire were garbage, as opposed to a local misuse
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::PacketTooShort { .. }
                | Self::ChecksumMismatch { .. }
                | Self::UnknownCommand(_)
                | Self::BadFrameMagic { .. }
                | Self::FrameTooLarge { .. }
        )
    }
}
