//! Transport layer for the ZKTeco protocol
//!
//! Moves whole packets to and from a terminal over TCP or UDP.

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::{Error, Result};
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to device
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Bound the time `connect` may take; connectionless transports ignore it
    fn set_connect_timeout(&mut self, _timeout: Duration) {}

    /// Send one encoded packet
    async fn send(&mut self, packet: &[u8]) -> Result<()>;

    /// Receive one encoded packet, waiting at most `timeout`
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Largest chunk to request per buffered read on this transport
    fn max_chunk(&self) -> u32;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
