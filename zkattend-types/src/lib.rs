//! Record types exchanged with ZKTeco terminals
//!
//! Fixed-layout user and attendance records, the packed device clock format,
//! and the capacity block returned by `CMD_GET_FREE_SIZES`.

pub mod attendance;
pub mod capacity;
pub mod device_info;
pub mod error;
pub mod time;
pub mod user;

mod cursor;

pub use attendance::{parse_attendance, AttendanceRecord};
pub use capacity::Capacity;
pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use user::{parse_users, DeviceUser, Privilege};
