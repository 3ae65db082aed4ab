//! # zkattend-sync
//!
//! Pulls punches from ZKTeco terminals and folds them into an attendance
//! ledger: one open/closed interval timeline per employee, plus a raw log
//! of every punch seen. Sync only appends to the raw log; clearing a
//! terminal purges that terminal's entries.
//!
//! ## Pipeline
//!
//! ```text
//! DeviceGateway -> normalize -> EmployeeResolver -> DuplicateFilter
//!               -> RawLogWriter -> Reconciler -> Ledger::commit
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use zkattend_sync::{Config, MemoryLedger, SyncService, ZkGatewayFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("zkattend.toml".as_ref())?;
//!     let ledger = Arc::new(MemoryLedger::open(&config.ledger_path)?);
//!     let factory = Box::new(ZkGatewayFactory::new(config.zone()?));
//!
//!     let service = SyncService::new(config, ledger, factory)?;
//!     for (device, result) in service.download_all().await {
//!         println!("{}: {:?}", device, result.map(|r| r.accepted()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dedup;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod raw_log;
pub mod reconcile;
pub mod resolver;
pub mod run;
pub mod service;
pub mod store;

pub use config::{Config, ConfigError, DeviceProfile, TransportKind};
pub use error::{GatewayError, RecordError, Result, StoreError, SyncError};
pub use gateway::{DeviceGateway, GatewayFactory, ZkGateway, ZkGatewayFactory};
pub use model::{AttendanceInterval, CanonicalPunch, Employee, EmployeeId, RawPunch};
pub use normalize::{normalize, Intent, NormalizedPunch};
pub use reconcile::{decide, Action, IntervalState, Reconciler};
pub use run::{DownloadRun, Outcome, RunReport};
pub use service::{download_notification, Notification, NotificationKind, SyncService};
pub use store::{EmployeeStore, IntervalStore, Ledger, MemoryLedger, RawPunchStore};
