//! One download from one terminal
//!
//! Connect, optionally push the clock, lock the terminal, pull the user
//! directory and punch log, then fold every punch into the ledger in
//! timestamp order. The terminal is always unlocked and disconnected
//! afterwards, whatever happened in between.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use zkattend::{AttendanceRecord, DeviceUser};

use crate::config::DeviceProfile;
use crate::dedup::DuplicateFilter;
use crate::error::{GatewayError, RecordError, Result, SyncError};
use crate::gateway::DeviceGateway;
use crate::model::PunchKey;
use crate::normalize::normalize;
use crate::raw_log::RawLogWriter;
use crate::reconcile::{Action, Reconciler, SkipReason};
use crate::resolver::EmployeeResolver;
use crate::store::Ledger;

/// What happened to one punch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Logged and folded into the timeline
    Reconciled(Action),

    /// Logged only; the code has no timeline meaning
    Logged,

    /// Logged only; older than the employee's latest interval boundary
    Stale,

    /// Already in the raw log
    Duplicate,
}

/// A punch that could not be processed
#[derive(Debug)]
pub struct RecordFailure {
    pub record: AttendanceRecord,
    pub error: RecordError,
}

/// Counts from one download
#[derive(Debug, Default)]
pub struct RunReport {
    pub device: String,
    pub fetched: usize,
    pub reconciled: usize,
    pub logged_only: usize,
    pub stale: usize,
    pub duplicates: usize,
    pub failures: Vec<RecordFailure>,
}

impl RunReport {
    fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            ..Default::default()
        }
    }

    /// Punches newly written to the raw log
    pub fn accepted(&self) -> usize {
        self.reconciled + self.logged_only + self.stale
    }

    fn record(&mut self, record: &AttendanceRecord, result: std::result::Result<Outcome, RecordError>) {
        match result {
            Ok(Outcome::Reconciled(_)) => self.reconciled += 1,
            Ok(Outcome::Logged) => self.logged_only += 1,
            Ok(Outcome::Stale) => self.stale += 1,
            Ok(Outcome::Duplicate) => self.duplicates += 1,
            Err(error) => {
                warn!("Skipping punch {}: {}", record, error);
                self.failures.push(RecordFailure {
                    record: record.clone(),
                    error,
                });
            }
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} fetched, {} new ({} reconciled, {} logged only, {} stale), {} duplicates, {} failed",
            self.device,
            self.fetched,
            self.accepted(),
            self.reconciled,
            self.logged_only,
            self.stale,
            self.duplicates,
            self.failures.len()
        )
    }
}

/// A single download run against one ledger
pub struct DownloadRun<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    profile: &'a DeviceProfile,
    zone: Tz,
    reconciler: Reconciler,
    batch_size: usize,
    sync_clock: bool,
}

impl<'a, L: Ledger + ?Sized> DownloadRun<'a, L> {
    pub fn new(ledger: &'a L, profile: &'a DeviceProfile, zone: Tz) -> Self {
        Self {
            ledger,
            profile,
            zone,
            reconciler: Reconciler::default(),
            batch_size: 50,
            sync_clock: false,
        }
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_clock_sync(mut self, sync_clock: bool) -> Self {
        self.sync_clock = sync_clock;
        self
    }

    pub async fn execute(&self, gateway: &mut dyn DeviceGateway) -> Result<RunReport> {
        let device = self.profile.name.as_str();
        info!("Downloading attendance from {}", device);

        gateway.connect().await.map_err(|e| self.gateway_error(e))?;

        let result = self.transfer(gateway).await;

        if let Err(e) = gateway.enable().await {
            warn!("Failed to re-enable {}: {}", device, e);
        }
        if let Err(e) = gateway.disconnect().await {
            warn!("Failed to disconnect from {}: {}", device, e);
        }

        match &result {
            Ok(report) => info!("{}", report),
            Err(e) => warn!("Download from {} failed: {}", device, e),
        }
        result
    }

    async fn transfer(&self, gateway: &mut dyn DeviceGateway) -> Result<RunReport> {
        if self.sync_clock {
            gateway
                .set_clock(Utc::now())
                .await
                .map_err(|e| self.gateway_error(e))?;
        }
        gateway.disable().await.map_err(|e| self.gateway_error(e))?;

        let users = gateway.list_users().await.map_err(|e| self.gateway_error(e))?;
        let mut punches = gateway
            .list_punches()
            .await
            .map_err(|e| self.gateway_error(e))?;

        if punches.is_empty() {
            return Err(SyncError::EmptyLog {
                device: self.profile.name.clone(),
            });
        }

        // Stable, so same-instant punches keep device order
        punches.sort_by_key(|p| p.timestamp);

        let directory: HashMap<&str, &DeviceUser> =
            users.iter().map(|u| (u.user_id.as_str(), u)).collect();
        let mut resolver = EmployeeResolver::new(self.ledger);
        let mut report = RunReport::new(&self.profile.name);
        report.fetched = punches.len();

        for (n, batch) in punches.chunks(self.batch_size).enumerate() {
            for record in batch {
                let result = self.process(record, &directory, &mut resolver).await;
                report.record(record, result);
            }
            self.ledger.commit().await?;
            debug!("Committed batch {} ({} punches)", n + 1, batch.len());
        }

        Ok(report)
    }

    async fn process(
        &self,
        record: &AttendanceRecord,
        directory: &HashMap<&str, &DeviceUser>,
        resolver: &mut EmployeeResolver<'_, L>,
    ) -> std::result::Result<Outcome, RecordError> {
        let punch = normalize(record, self.zone)?;
        let user = directory
            .get(record.user_id.as_str())
            .ok_or_else(|| RecordError::UnknownDeviceUser(record.user_id.clone()))?;
        let employee_id = resolver.resolve(&user.user_id, &user.name).await?;

        let key = PunchKey {
            device_user_id: punch.device_user_id.clone(),
            timestamp: punch.at,
            device: self.profile.name.clone(),
        };
        let duplicate = DuplicateFilter::new(self.ledger)
            .is_duplicate(&key)
            .await
            .map_err(|source| RecordError::DuplicateCheck {
                user_id: punch.device_user_id.clone(),
                source,
            })?;
        if duplicate {
            return Ok(Outcome::Duplicate);
        }

        RawLogWriter::new(self.ledger, &self.profile.name, self.profile.location.as_deref())
            .append(&punch, employee_id)
            .await
            .map_err(|source| RecordError::Log {
                user_id: punch.device_user_id.clone(),
                source,
            })?;

        let action = self
            .reconciler
            .apply(self.ledger, &punch.for_employee(employee_id))
            .await
            .map_err(|source| RecordError::Reconcile {
                user_id: punch.device_user_id.clone(),
                at: punch.at,
                source,
            })?;

        Ok(match action {
            Action::Skip(SkipReason::NotAttendance(code)) => {
                debug!("Punch code {} of {} kept in raw log only", code, punch.device_user_id);
                Outcome::Logged
            }
            Action::Skip(SkipReason::Stale) => {
                debug!("Punch of {} at {} predates its timeline", punch.device_user_id, punch.at);
                Outcome::Stale
            }
            action => Outcome::Reconciled(action),
        })
    }

    fn gateway_error(&self, err: GatewayError) -> SyncError {
        SyncError::from_gateway(&self.profile.name, err)
    }
}
