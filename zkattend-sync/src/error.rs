use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failure talking to a terminal
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Cannot reach device: {0}")]
    Connection(String),

    #[error("Device protocol error: {0}")]
    Protocol(String),
}

impl From<zkattend::Error> for GatewayError {
    fn from(err: zkattend::Error) -> Self {
        if err.is_connection_failure() {
            GatewayError::Connection(err.to_string())
        } else {
            GatewayError::Protocol(err.to_string())
        }
    }
}

/// Failure of the attendance ledger
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule would be broken
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The snapshot parsed but its records do not fit together
    #[error("Corrupt ledger: {0}")]
    Corrupt(String),
}

/// Failure confined to a single punch; the run goes on
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Local time {local} of user {user_id} is ambiguous or skipped in {zone}")]
    Normalize {
        user_id: String,
        local: NaiveDateTime,
        zone: Tz,
    },

    #[error("User {0} is not in the device directory")]
    UnknownDeviceUser(String),

    #[error("Cannot resolve employee for user {user_id}: {source}")]
    Resolve {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Duplicate check failed for user {user_id}: {source}")]
    DuplicateCheck {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Cannot log punch of user {user_id}: {source}")]
    Log {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Cannot reconcile punch of user {user_id} at {at}: {source}")]
    Reconcile {
        user_id: String,
        at: DateTime<Utc>,
        #[source]
        source: StoreError,
    },
}

/// Failure aborting a whole operation
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cannot reach device {device}: {reason}")]
    Connection { device: String, reason: String },

    #[error("Device {device} sent an unusable response: {reason}")]
    Protocol { device: String, reason: String },

    /// The terminal holds no punches
    #[error("Attendance log of device {device} is empty")]
    EmptyLog { device: String },

    #[error("Ledger error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn from_gateway(device: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::Connection(reason) => SyncError::Connection {
                device: device.to_string(),
                reason,
            },
            GatewayError::Protocol(reason) => SyncError::Protocol {
                device: device.to_string(),
                reason,
            },
        }
    }

    /// True when the failure is the operator's to fix rather than the device's
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyLog { .. } | SyncError::UnknownDevice(_) | SyncError::Config(_)
        )
    }
}
