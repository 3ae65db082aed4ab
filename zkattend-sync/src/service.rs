//! Operator-facing commands over the configured terminals

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::{info, warn};
use zkattend::DeviceInfo;

use crate::config::{Config, DeviceProfile};
use crate::error::{GatewayResult, Result, SyncError};
use crate::gateway::{DeviceGateway, GatewayFactory};
use crate::reconcile::Reconciler;
use crate::run::{DownloadRun, RunReport};
use crate::store::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failure,
}

/// Short outcome message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Failure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NotificationKind::Success => write!(f, "OK: {}", self.message),
            NotificationKind::Failure => write!(f, "FAILED: {}", self.message),
        }
    }
}

pub struct SyncService<L: Ledger> {
    config: Config,
    zone: Tz,
    ledger: Arc<L>,
    factory: Box<dyn GatewayFactory>,

    // One operation per terminal at a time
    locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<L: Ledger> SyncService<L> {
    pub fn new(config: Config, ledger: Arc<L>, factory: Box<dyn GatewayFactory>) -> Result<Self> {
        let zone = config.zone().map_err(|e| SyncError::Config(e.to_string()))?;
        Ok(Self {
            config,
            zone,
            ledger,
            factory,
            locks: parking_lot::Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Connect, read identity and counts, disconnect
    pub async fn test_connection(&self, device: &str) -> Result<DeviceInfo> {
        let profile = self.profile(device)?;
        let lock = self.run_lock(device);
        let _guard = lock.lock().await;

        let mut gateway = self.connect(profile).await?;
        let result = gateway.describe().await;
        self.release(profile, gateway.as_mut()).await;

        let info = result.map_err(|e| SyncError::from_gateway(device, e))?;
        info!("{} is reachable: {}", device, info);
        Ok(info)
    }

    /// Push the host clock to the terminal
    pub async fn set_clock(&self, device: &str) -> Result<DateTime<Utc>> {
        let profile = self.profile(device)?;
        let lock = self.run_lock(device);
        let _guard = lock.lock().await;

        let mut gateway = self.connect(profile).await?;
        let now = Utc::now();
        let result = gateway.set_clock(now).await;
        self.release(profile, gateway.as_mut()).await;

        result.map_err(|e| SyncError::from_gateway(device, e))?;
        Ok(now)
    }

    /// Wipe the terminal's punch log together with its raw log in the ledger
    ///
    /// Intervals built from those punches stay. Returns how many raw-log
    /// entries were dropped.
    pub async fn clear_device_log(&self, device: &str) -> Result<usize> {
        let profile = self.profile(device)?;
        let lock = self.run_lock(device);
        let _guard = lock.lock().await;

        let mut gateway = self.connect(profile).await?;
        let result = clear_if_not_empty(gateway.as_mut()).await;
        self.release(profile, gateway.as_mut()).await;

        if !result.map_err(|e| SyncError::from_gateway(device, e))? {
            return Err(SyncError::EmptyLog {
                device: device.to_string(),
            });
        }

        let dropped = self.ledger.clear_punches(device).await?;
        self.ledger.commit().await?;
        warn!(
            "Cleared attendance log on {} and {} raw-log entries",
            device, dropped
        );
        Ok(dropped)
    }

    pub async fn restart_device(&self, device: &str) -> Result<()> {
        let profile = self.profile(device)?;
        let lock = self.run_lock(device);
        let _guard = lock.lock().await;

        let mut gateway = self.connect(profile).await?;
        let result = gateway.restart().await;
        self.release(profile, gateway.as_mut()).await;

        result.map_err(|e| SyncError::from_gateway(device, e))
    }

    pub async fn download(&self, device: &str) -> Result<RunReport> {
        let profile = self.profile(device)?;
        let lock = self.run_lock(device);
        let _guard = lock.lock().await;

        let mut gateway = self.factory.gateway(profile);
        DownloadRun::new(self.ledger.as_ref(), profile, self.zone)
            .with_reconciler(Reconciler::new(self.config.bridge_window()))
            .with_batch_size(self.config.batch_size)
            .with_clock_sync(self.config.sync_clock)
            .execute(gateway.as_mut())
            .await
    }

    /// Download every configured terminal in turn
    ///
    /// A failing terminal does not stop the others.
    pub async fn download_all(&self) -> Vec<(String, Result<RunReport>)> {
        let mut results = Vec::with_capacity(self.config.devices.len());
        for profile in &self.config.devices {
            let result = self.download(&profile.name).await;
            results.push((profile.name.clone(), result));
        }

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            warn!("{} of {} devices failed to download", failed, results.len());
        }
        results
    }

    fn profile(&self, device: &str) -> Result<&DeviceProfile> {
        self.config
            .device(device)
            .ok_or_else(|| SyncError::UnknownDevice(device.to_string()))
    }

    fn run_lock(&self, device: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(device.to_string())
            .or_default()
            .clone()
    }

    async fn connect(&self, profile: &DeviceProfile) -> Result<Box<dyn DeviceGateway>> {
        let mut gateway = self.factory.gateway(profile);
        gateway
            .connect()
            .await
            .map_err(|e| SyncError::from_gateway(&profile.name, e))?;
        Ok(gateway)
    }

    async fn release(&self, profile: &DeviceProfile, gateway: &mut dyn DeviceGateway) {
        if let Err(e) = gateway.disconnect().await {
            warn!("Failed to disconnect from {}: {}", profile.name, e);
        }
    }
}

/// False when there was nothing to clear
async fn clear_if_not_empty(gateway: &mut dyn DeviceGateway) -> GatewayResult<bool> {
    if gateway.list_punches().await?.is_empty() {
        return Ok(false);
    }
    gateway.clear_punch_log().await?;
    Ok(true)
}

/// Operator message for a finished download
pub fn download_notification(device: &str, result: &Result<RunReport>) -> Notification {
    match result {
        Ok(report) if report.failures.is_empty() => Notification::success(report.to_string()),
        Ok(report) => Notification::failure(format!(
            "{}; first failure: {}",
            report, report.failures[0].error
        )),
        Err(e) => Notification::failure(format!("{}: {}", device, e)),
    }
}
