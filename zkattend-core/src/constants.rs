//! Protocol constants

/// First half of the TCP frame magic (`PP` on the wire)
pub const TCP_MAGIC_1: u16 = 0x5050;

/// Second half of the TCP frame magic
pub const TCP_MAGIC_2: u16 = 0x7D82;

/// Default connection timeout (seconds)
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Largest chunk requested per `CMD_READ_BUFFER` over TCP
pub const MAX_CHUNK_TCP: u32 = 0xFFC0;

/// Largest chunk requested per `CMD_READ_BUFFER` over UDP
pub const MAX_CHUNK_UDP: u32 = 16 * 1024;

/// Largest transfer buffer accepted for one bulk read
pub const MAX_BUFFER_SIZE: u32 = 64 * 1024 * 1024;

/// Ticks value mixed into the CommKey
pub const COMMKEY_TICKS: u8 = 50;

/// Data type flags (for CMD_DB_RRQ, CMD_USERTEMP_RRQ, etc.)
pub mod data_types {
    /// Attendance log
    pub const FCT_ATTLOG: u8 = 1;

    /// Fingerprint template
    pub const FCT_FINGERTMP: u8 = 2;

    /// Operation log
    pub const FCT_OPLOG: u8 = 4;

    /// User record
    pub const FCT_USER: u8 = 5;
}

/// Option keys readable through `CMD_OPTIONS_RRQ`
pub mod options {
    pub const SERIAL_NUMBER: &str = "~SerialNumber";
    pub const DEVICE_NAME: &str = "~DeviceName";
    pub const PLATFORM: &str = "~Platform";
}
