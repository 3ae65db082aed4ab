//! Configuration file
//!
//! ```toml
//! timezone = "Asia/Jakarta"
//! ledger_path = "zkattend-ledger.json"
//!
//! [schedule]
//! interval_secs = 300
//!
//! [[devices]]
//! name = "front-door"
//! address = "192.168.1.201"
//! location = "Head office"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::parse_zone;
use crate::reconcile::DEFAULT_BRIDGE_WINDOW_SECS;

const MAX_BRIDGE_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// IANA zone the terminals' clocks run in; GMT when unset
    #[serde(default)]
    pub timezone: Option<String>,

    /// How close a repeated check-out must follow the last one to be bridged
    #[serde(default = "default_bridge_window_secs")]
    pub bridge_window_secs: u64,

    /// Punches per ledger commit
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Push the host clock to the terminal before each download
    #[serde(default = "default_sync_clock")]
    pub sync_clock: bool,

    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub devices: Vec<DeviceProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Tcp,
    Udp,
}

/// One terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Communication key, 0 when the terminal has none
    #[serde(default)]
    pub password: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Working location recorded on every punch from this terminal
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub transport: TransportKind,
}

impl DeviceProfile {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_zone(self.timezone.as_deref()).map_err(ConfigError::Validation)?;

        if self.batch_size == 0 {
            return Err(ConfigError::Validation("batch_size must be at least 1".into()));
        }
        if self.bridge_window_secs > MAX_BRIDGE_WINDOW_SECS {
            return Err(ConfigError::Validation(
                "bridge_window_secs must not exceed one day".into(),
            ));
        }
        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.interval_secs must be at least 1".into(),
            ));
        }

        let mut names = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(ConfigError::Validation("device name must not be empty".into()));
            }
            if !names.insert(device.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "device '{}' is configured twice",
                    device.name
                )));
            }
        }
        Ok(())
    }

    /// Configured zone, GMT when unset
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        parse_zone(self.timezone.as_deref()).map_err(ConfigError::Validation)
    }

    pub fn bridge_window(&self) -> TimeDelta {
        TimeDelta::seconds(self.bridge_window_secs.min(MAX_BRIDGE_WINDOW_SECS) as i64)
    }

    pub fn device(&self, name: &str) -> Option<&DeviceProfile> {
        self.devices.iter().find(|d| d.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: None,
            bridge_window_secs: default_bridge_window_secs(),
            batch_size: default_batch_size(),
            sync_clock: default_sync_clock(),
            ledger_path: default_ledger_path(),
            schedule: ScheduleConfig::default(),
            devices: Vec::new(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

const fn default_bridge_window_secs() -> u64 {
    DEFAULT_BRIDGE_WINDOW_SECS
}

const fn default_batch_size() -> usize {
    50
}

const fn default_sync_clock() -> bool {
    true
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("zkattend-ledger.json")
}

const fn default_interval_secs() -> u64 {
    300
}

const fn default_port() -> u16 {
    zkattend::DEFAULT_PORT
}

const fn default_timeout_secs() -> u64 {
    15
}
