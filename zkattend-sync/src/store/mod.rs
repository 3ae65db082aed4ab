//! Attendance ledger repositories
//!
//! The reconciliation pipeline only talks to these traits. Every write is
//! visible to subsequent reads right away; [`Ledger::commit`] makes the
//! writes so far durable.

mod memory;
mod snapshot;

pub use memory::MemoryLedger;
pub use snapshot::Snapshot;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::model::{
    AttendanceInterval, Employee, EmployeeId, IntervalId, NewEmployee, NewInterval, PunchKey,
    RawPunch,
};

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_employee(&self, device_user_id: &str) -> StoreResult<Option<Employee>>;

    /// Fails with `Conflict` when another employee already has the device user id
    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee>;

    async fn employees(&self) -> StoreResult<Vec<Employee>>;
}

#[async_trait]
pub trait IntervalStore: Send + Sync {
    /// Interval with the latest check-in for the employee
    async fn latest_interval(&self, employee: EmployeeId)
    -> StoreResult<Option<AttendanceInterval>>;

    /// Fails with `Conflict` when an open interval would sit next to another one
    async fn create_interval(&self, new: NewInterval) -> StoreResult<AttendanceInterval>;

    async fn close_interval(&self, id: IntervalId, check_out: DateTime<Utc>) -> StoreResult<()>;

    /// All intervals of the employee ordered by check-in
    async fn intervals_for(&self, employee: EmployeeId) -> StoreResult<Vec<AttendanceInterval>>;
}

#[async_trait]
pub trait RawPunchStore: Send + Sync {
    async fn contains_punch(&self, key: &PunchKey) -> StoreResult<bool>;

    /// Fails with `Conflict` when the key is already logged
    async fn append_punch(&self, punch: RawPunch) -> StoreResult<()>;

    async fn punches(&self) -> StoreResult<Vec<RawPunch>>;

    /// Drop every logged punch of one terminal; returns how many went
    async fn clear_punches(&self, device: &str) -> StoreResult<usize>;
}

#[async_trait]
pub trait Ledger: EmployeeStore + IntervalStore + RawPunchStore {
    async fn commit(&self) -> StoreResult<()>;
}
