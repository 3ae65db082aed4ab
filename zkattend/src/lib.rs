//! # zkattend
//!
//! Talk to ZKTeco attendance terminals: connect, read the user directory and
//! punch log, set the clock, clear the log.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zkattend::Device;
//!
//! #[tokio::main]
//! async fn main() -> zkattend::Result<()> {
//!     let mut device = Device::new("192.168.1.201", 4370);
//!     device.connect().await?;
//!
//!     for user in device.get_users().await? {
//!         println!("{}", user);
//!     }
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;

// Re-exports
pub use device::Device;
pub use error::{Error, Result};

pub use zkattend_core::{Command, Packet, Session, DEFAULT_PORT};
pub use zkattend_types::{AttendanceRecord, Capacity, DeviceInfo, DeviceUser};
