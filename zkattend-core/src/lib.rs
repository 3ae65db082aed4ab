//! # zkattend-core
//!
//! Wire-level primitives for talking to ZKTeco attendance terminals.
//!
//! This crate provides:
//! - Packet structure and encoding/decoding
//! - TCP frame header used when the protocol runs over a stream
//! - Checksum calculation
//! - Command definitions
//! - CommKey authentication
//! - Session bookkeeping (session id, reply counter)

pub mod auth;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod packet;
pub mod session;

pub use auth::make_commkey;
pub use command::Command;
pub use error::{Error, Result};
pub use frame::FrameHeader;
pub use packet::Packet;
pub use session::{Session, SessionState};

/// Default device port
pub const DEFAULT_PORT: u16 = 4370;

/// Maximum packet size (64KB)
pub const MAX_PACKET_SIZE: usize = 65535;
