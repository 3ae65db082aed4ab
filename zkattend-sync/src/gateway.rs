//! Device link seen by the sync pipeline
//!
//! [`DeviceGateway`] is the whole contract the pipeline needs from a
//! terminal. [`ZkGateway`] fulfils it over the ZKTeco protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;
use zkattend::{AttendanceRecord, Device, DeviceInfo, DeviceUser};

use crate::config::{DeviceProfile, TransportKind};
use crate::error::GatewayResult;
use crate::normalize::to_local;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceGateway: Send {
    async fn connect(&mut self) -> GatewayResult<()>;

    /// Lock the keypad and sensor for the duration of a transfer
    async fn disable(&mut self) -> GatewayResult<()>;

    async fn enable(&mut self) -> GatewayResult<()>;

    async fn describe(&mut self) -> GatewayResult<DeviceInfo>;

    async fn list_users(&mut self) -> GatewayResult<Vec<DeviceUser>>;

    async fn list_punches(&mut self) -> GatewayResult<Vec<AttendanceRecord>>;

    async fn clear_punch_log(&mut self) -> GatewayResult<()>;

    /// Set the terminal's wall clock to `at` in the terminal's zone
    async fn set_clock(&mut self, at: DateTime<Utc>) -> GatewayResult<()>;

    async fn restart(&mut self) -> GatewayResult<()>;

    async fn disconnect(&mut self) -> GatewayResult<()>;
}

/// Builds a gateway for a configured terminal
pub trait GatewayFactory: Send + Sync {
    fn gateway(&self, profile: &DeviceProfile) -> Box<dyn DeviceGateway>;
}

/// Gateway over a ZKTeco terminal
pub struct ZkGateway {
    device: Device,
    zone: Tz,

    // Needed to resolve compact attendance records
    users: Option<Vec<DeviceUser>>,
}

impl ZkGateway {
    pub fn new(profile: &DeviceProfile, zone: Tz) -> Self {
        let device = match profile.transport {
            TransportKind::Tcp => Device::new(profile.address.clone(), profile.port),
            TransportKind::Udp => Device::new_udp(profile.address.clone(), profile.port),
        };
        Self::with_device(
            device
                .with_timeout(profile.timeout())
                .with_password(profile.password),
            zone,
        )
    }

    pub fn with_device(device: Device, zone: Tz) -> Self {
        Self {
            device,
            zone,
            users: None,
        }
    }
}

#[async_trait]
impl DeviceGateway for ZkGateway {
    async fn connect(&mut self) -> GatewayResult<()> {
        self.users = None;
        Ok(self.device.connect().await?)
    }

    async fn disable(&mut self) -> GatewayResult<()> {
        Ok(self.device.disable_device().await?)
    }

    async fn enable(&mut self) -> GatewayResult<()> {
        Ok(self.device.enable_device().await?)
    }

    async fn describe(&mut self) -> GatewayResult<DeviceInfo> {
        Ok(self.device.get_device_info().await?)
    }

    async fn list_users(&mut self) -> GatewayResult<Vec<DeviceUser>> {
        let users = self.device.get_users().await?;
        self.users = Some(users.clone());
        Ok(users)
    }

    async fn list_punches(&mut self) -> GatewayResult<Vec<AttendanceRecord>> {
        let users = match self.users.take() {
            Some(users) => users,
            None => self.device.get_users().await?,
        };
        let records = self.device.get_attendance_for(&users).await;
        self.users = Some(users);
        Ok(records?)
    }

    async fn clear_punch_log(&mut self) -> GatewayResult<()> {
        Ok(self.device.clear_attendance().await?)
    }

    async fn set_clock(&mut self, at: DateTime<Utc>) -> GatewayResult<()> {
        let local = to_local(at, self.zone);
        debug!("Device clock {} ({} in {})", local, at, self.zone);
        Ok(self.device.set_time(local).await?)
    }

    async fn restart(&mut self) -> GatewayResult<()> {
        Ok(self.device.restart().await?)
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        self.users = None;
        Ok(self.device.disconnect().await?)
    }
}

/// Builds [`ZkGateway`]s in a fixed zone
pub struct ZkGatewayFactory {
    zone: Tz,
}

impl ZkGatewayFactory {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }
}

impl GatewayFactory for ZkGatewayFactory {
    fn gateway(&self, profile: &DeviceProfile) -> Box<dyn DeviceGateway> {
        Box::new(ZkGateway::new(profile, self.zone))
    }
}
