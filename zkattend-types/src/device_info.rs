//! Device information structures

use std::fmt;

use crate::capacity::Capacity;

/// What a terminal says about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial_number: String,

    /// Firmware version
    pub firmware_version: String,

    /// Platform name
    pub platform: Option<String>,

    /// Device name (user-assigned)
    pub device_name: Option<String>,

    /// Store counts at the time of the query
    pub capacity: Capacity,
}

impl DeviceInfo {
    pub fn new(serial_number: String, firmware_version: String) -> Self {
        Self {
            serial_number,
            firmware_version,
            platform: None,
            device_name: None,
            capacity: Capacity::default(),
        }
    }

    /// Parse a `~Key=Value\0` option reply, returning the value
    pub fn option_value(reply: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(reply);
        let text = text.trim_end_matches('\0');
        let (_, value) = text.split_once('=')?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[SN: {}, FW: {}",
            self.serial_number, self.firmware_version
        )?;
        if let Some(name) = &self.device_name {
            write!(f, ", name: {}", name)?;
        }
        write!(f, ", {}]", self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_value() {
        assert_eq!(
            DeviceInfo::option_value(b"~SerialNumber=BJ2C184960012\0"),
            Some("BJ2C184960012".to_string())
        );
        assert_eq!(DeviceInfo::option_value(b"~DeviceName=\0"), None);
        assert_eq!(DeviceInfo::option_value(b"garbage"), None);
    }

    #[test]
    fn test_display() {
        let mut info = DeviceInfo::new("SN1".into(), "Ver 6.60".into());
        info.device_name = Some("uFace202".into());
        assert!(info.to_string().starts_with("Device[SN: SN1, FW: Ver 6.60, name: uFace202"));
    }
}
