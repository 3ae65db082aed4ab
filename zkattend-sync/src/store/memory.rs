use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::snapshot::Snapshot;
use super::{EmployeeStore, IntervalStore, Ledger, RawPunchStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    AttendanceInterval, Employee, EmployeeId, IntervalId, NewEmployee, NewInterval, PunchKey,
    RawPunch,
};

/// In-process ledger, optionally persisted as a JSON snapshot on commit
pub struct MemoryLedger {
    data: Mutex<LedgerData>,
    path: Option<PathBuf>,
}

#[derive(Default)]
struct LedgerData {
    // Ids are positions + 1
    employees: Vec<Employee>,
    intervals: Vec<AttendanceInterval>,
    punches: Vec<RawPunch>,

    by_device_user: HashMap<String, EmployeeId>,
    by_employee: HashMap<EmployeeId, Vec<IntervalId>>,
    punch_keys: HashSet<PunchKey>,
}

impl LedgerData {
    fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        let mut data = LedgerData {
            employees: snapshot.employees,
            intervals: snapshot.intervals,
            punches: snapshot.punches,
            ..Default::default()
        };

        for (pos, employee) in data.employees.iter().enumerate() {
            if employee.id.0 != pos as u64 + 1 {
                return Err(corrupt(format!("{} stored at position {}", employee.id, pos + 1)));
            }
            if let Some(device_user_id) = &employee.device_user_id {
                if data
                    .by_device_user
                    .insert(device_user_id.clone(), employee.id)
                    .is_some()
                {
                    return Err(corrupt(format!(
                        "device user {} belongs to several employees",
                        device_user_id
                    )));
                }
            }
        }
        for (pos, interval) in data.intervals.iter().enumerate() {
            if interval.id.0 != pos as u64 + 1 {
                return Err(corrupt(format!("{} stored at position {}", interval.id, pos + 1)));
            }
            if data.employee(interval.employee_id).is_none() {
                return Err(corrupt(format!(
                    "{} belongs to unknown {}",
                    interval.id, interval.employee_id
                )));
            }
            data.by_employee
                .entry(interval.employee_id)
                .or_default()
                .push(interval.id);
        }
        for punch in &data.punches {
            if !data.punch_keys.insert(punch.key()) {
                return Err(corrupt(format!(
                    "punch of {} at {} from {} is logged twice",
                    punch.device_user_id, punch.timestamp, punch.device
                )));
            }
        }
        Ok(data)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            employees: self.employees.clone(),
            intervals: self.intervals.clone(),
            punches: self.punches.clone(),
        }
    }

    fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.employees.get(i))
    }

    fn interval(&self, id: IntervalId) -> Option<&AttendanceInterval> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.intervals.get(i))
    }

    fn intervals_of(&self, employee: EmployeeId) -> impl Iterator<Item = &AttendanceInterval> {
        self.by_employee
            .get(&employee)
            .into_iter()
            .flatten()
            .filter_map(|id| self.interval(*id))
    }
}

fn corrupt(reason: String) -> StoreError {
    StoreError::Corrupt(reason)
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(LedgerData::default()),
            path: None,
        }
    }

    /// Ledger backed by the snapshot at `path`, created on first commit
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = Snapshot::load(&path)?;
        debug!(
            "Opened ledger {} with {} employees, {} intervals, {} punches",
            path.display(),
            snapshot.employees.len(),
            snapshot.intervals.len(),
            snapshot.punches.len()
        );
        Ok(Self {
            data: Mutex::new(LedgerData::from_snapshot(snapshot)?),
            path: Some(path),
        })
    }

    /// In-process ledger seeded from a snapshot, never written back
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        Ok(Self {
            data: Mutex::new(LedgerData::from_snapshot(snapshot)?),
            path: None,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        self.data.lock().snapshot()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmployeeStore for MemoryLedger {
    async fn find_employee(&self, device_user_id: &str) -> StoreResult<Option<Employee>> {
        let data = self.data.lock();
        Ok(data
            .by_device_user
            .get(device_user_id)
            .and_then(|id| data.employee(*id))
            .cloned())
    }

    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut data = self.data.lock();
        if data.by_device_user.contains_key(&new.device_user_id) {
            return Err(StoreError::Conflict(format!(
                "device user {} already belongs to an employee",
                new.device_user_id
            )));
        }

        let employee = Employee {
            id: EmployeeId(data.employees.len() as u64 + 1),
            name: new.name,
            device_user_id: Some(new.device_user_id.clone()),
        };
        data.by_device_user.insert(new.device_user_id, employee.id);
        data.employees.push(employee.clone());
        Ok(employee)
    }

    async fn employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.data.lock().employees.clone())
    }
}

#[async_trait]
impl IntervalStore for MemoryLedger {
    async fn latest_interval(
        &self,
        employee: EmployeeId,
    ) -> StoreResult<Option<AttendanceInterval>> {
        let data = self.data.lock();
        // Later ids win ties on check-in
        Ok(data
            .intervals_of(employee)
            .max_by_key(|i| (i.check_in, i.id))
            .cloned())
    }

    async fn create_interval(&self, new: NewInterval) -> StoreResult<AttendanceInterval> {
        let mut data = self.data.lock();
        if new.check_out.is_none() && data.intervals_of(new.employee_id).any(|i| i.is_open()) {
            return Err(StoreError::Conflict(format!(
                "{} already has an open interval",
                new.employee_id
            )));
        }
        if matches!(new.check_out, Some(out) if out < new.check_in) {
            return Err(StoreError::Conflict("check-out precedes check-in".into()));
        }

        let interval = AttendanceInterval {
            id: IntervalId(data.intervals.len() as u64 + 1),
            employee_id: new.employee_id,
            check_in: new.check_in,
            check_out: new.check_out,
        };
        data.by_employee
            .entry(interval.employee_id)
            .or_default()
            .push(interval.id);
        data.intervals.push(interval.clone());
        Ok(interval)
    }

    async fn close_interval(&self, id: IntervalId, check_out: DateTime<Utc>) -> StoreResult<()> {
        let mut data = self.data.lock();
        let interval = (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| data.intervals.get_mut(i))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !interval.is_open() {
            return Err(StoreError::Conflict(format!("{} is already closed", id)));
        }
        if check_out < interval.check_in {
            return Err(StoreError::Conflict(format!(
                "check-out {} precedes check-in of {}",
                check_out, id
            )));
        }
        interval.check_out = Some(check_out);
        Ok(())
    }

    async fn intervals_for(&self, employee: EmployeeId) -> StoreResult<Vec<AttendanceInterval>> {
        let data = self.data.lock();
        let mut intervals: Vec<_> = data.intervals_of(employee).cloned().collect();
        intervals.sort_by_key(|i| (i.check_in, i.id));
        Ok(intervals)
    }
}

#[async_trait]
impl RawPunchStore for MemoryLedger {
    async fn contains_punch(&self, key: &PunchKey) -> StoreResult<bool> {
        Ok(self.data.lock().punch_keys.contains(key))
    }

    async fn append_punch(&self, punch: RawPunch) -> StoreResult<()> {
        let mut data = self.data.lock();
        if !data.punch_keys.insert(punch.key()) {
            return Err(StoreError::Conflict(format!(
                "punch of {} at {} from {} is already logged",
                punch.device_user_id, punch.timestamp, punch.device
            )));
        }
        data.punches.push(punch);
        Ok(())
    }

    async fn punches(&self) -> StoreResult<Vec<RawPunch>> {
        Ok(self.data.lock().punches.clone())
    }

    async fn clear_punches(&self, device: &str) -> StoreResult<usize> {
        let mut data = self.data.lock();
        let before = data.punches.len();
        data.punches.retain(|p| p.device != device);
        data.punch_keys.retain(|k| k.device != device);
        Ok(before - data.punches.len())
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn commit(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = self.snapshot();
        snapshot.save(path)?;
        debug!("Committed ledger to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, h, m, 0).unwrap()
    }

    fn punch(user: &str, when: DateTime<Utc>) -> RawPunch {
        RawPunch {
            device_user_id: user.into(),
            timestamp: when,
            punch_type: "0".into(),
            status: "1".into(),
            device: "gate".into(),
            location: Some("HQ".into()),
            employee_id: EmployeeId(1),
        }
    }

    async fn employee(ledger: &MemoryLedger, user: &str) -> Employee {
        ledger
            .create_employee(NewEmployee {
                name: format!("User {}", user),
                device_user_id: user.into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_employee_device_id_is_unique() {
        let ledger = MemoryLedger::new();
        let alice = employee(&ledger, "1001").await;
        assert_eq!(alice.id, EmployeeId(1));

        let err = ledger
            .create_employee(NewEmployee {
                name: "Other".into(),
                device_user_id: "1001".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert_eq!(ledger.find_employee("1001").await.unwrap(), Some(alice));
        assert_eq!(ledger.find_employee("9999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_single_open_interval() {
        let ledger = MemoryLedger::new();
        let alice = employee(&ledger, "1001").await;

        let open = ledger
            .create_interval(NewInterval {
                employee_id: alice.id,
                check_in: at(8, 0),
                check_out: None,
            })
            .await
            .unwrap();

        let err = ledger
            .create_interval(NewInterval {
                employee_id: alice.id,
                check_in: at(9, 0),
                check_out: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        ledger.close_interval(open.id, at(17, 0)).await.unwrap();
        assert!(ledger.close_interval(open.id, at(18, 0)).await.is_err());

        let latest = ledger.latest_interval(alice.id).await.unwrap().unwrap();
        assert_eq!(latest.check_out, Some(at(17, 0)));
    }

    #[tokio::test]
    async fn test_close_rejects_check_out_before_check_in() {
        let ledger = MemoryLedger::new();
        let alice = employee(&ledger, "1001").await;
        let open = ledger
            .create_interval(NewInterval {
                employee_id: alice.id,
                check_in: at(8, 0),
                check_out: None,
            })
            .await
            .unwrap();

        assert!(ledger.close_interval(open.id, at(7, 0)).await.is_err());
        assert!(ledger.close_interval(IntervalId(42), at(9, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_raw_log_rejects_duplicate_key() {
        let ledger = MemoryLedger::new();
        ledger.append_punch(punch("1001", at(8, 0))).await.unwrap();

        let mut same_key = punch("1001", at(8, 0));
        same_key.punch_type = "1".into();
        assert!(ledger.append_punch(same_key).await.is_err());

        let key = punch("1001", at(8, 0)).key();
        assert!(ledger.contains_punch(&key).await.unwrap());
        assert_eq!(ledger.punches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_punches_only_touches_one_device() {
        let ledger = MemoryLedger::new();
        ledger.append_punch(punch("1001", at(8, 0))).await.unwrap();
        ledger.append_punch(punch("1001", at(17, 0))).await.unwrap();
        let mut lobby = punch("1001", at(8, 0));
        lobby.device = "lobby".into();
        ledger.append_punch(lobby.clone()).await.unwrap();

        assert_eq!(ledger.clear_punches("gate").await.unwrap(), 2);
        assert_eq!(ledger.punches().await.unwrap(), vec![lobby.clone()]);
        assert!(!ledger.contains_punch(&punch("1001", at(8, 0)).key()).await.unwrap());
        assert!(ledger.contains_punch(&lobby.key()).await.unwrap());

        // The same punch may be logged again once the device was wiped
        ledger.append_punch(punch("1001", at(8, 0))).await.unwrap();
        assert_eq!(ledger.clear_punches("nowhere").await.unwrap(), 0);
    }

    #[test]
    fn test_snapshot_ids_are_validated() {
        let alice = Employee {
            id: EmployeeId(1),
            name: "Alice".into(),
            device_user_id: Some("1001".into()),
        };
        let interval = AttendanceInterval {
            id: IntervalId(1),
            employee_id: alice.id,
            check_in: at(8, 0),
            check_out: None,
        };
        let good = Snapshot {
            employees: vec![alice.clone()],
            intervals: vec![interval.clone()],
            punches: vec![punch("1001", at(8, 0))],
        };
        assert!(MemoryLedger::from_snapshot(good.clone()).is_ok());

        let zero_id = Snapshot {
            employees: vec![Employee {
                id: EmployeeId(0),
                ..alice.clone()
            }],
            ..good.clone()
        };
        let orphan = Snapshot {
            intervals: vec![AttendanceInterval {
                employee_id: EmployeeId(7),
                ..interval.clone()
            }],
            ..good.clone()
        };
        let gap = Snapshot {
            intervals: vec![AttendanceInterval {
                id: IntervalId(3),
                ..interval
            }],
            ..good.clone()
        };
        let twice = Snapshot {
            punches: vec![punch("1001", at(8, 0)), punch("1001", at(8, 0))],
            ..good
        };
        for bad in [zero_id, orphan, gap, twice] {
            assert!(matches!(
                MemoryLedger::from_snapshot(bad),
                Err(StoreError::Corrupt(_))
            ));
        }
    }

    #[test]
    fn test_open_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.json");
        let snapshot = Snapshot {
            employees: vec![Employee {
                id: EmployeeId(0),
                name: "Alice".into(),
                device_user_id: Some("1001".into()),
            }],
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        assert!(matches!(MemoryLedger::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger").join("attendance.json");

        let ledger = MemoryLedger::open(&path).unwrap();
        let alice = employee(&ledger, "1001").await;
        ledger
            .create_interval(NewInterval {
                employee_id: alice.id,
                check_in: at(8, 0),
                check_out: None,
            })
            .await
            .unwrap();
        ledger.append_punch(punch("1001", at(8, 0))).await.unwrap();
        ledger.commit().await.unwrap();

        let reopened = MemoryLedger::open(&path).unwrap();
        assert_eq!(reopened.snapshot(), ledger.snapshot());
        assert_eq!(
            reopened.find_employee("1001").await.unwrap().map(|e| e.id),
            Some(alice.id)
        );
        assert!(
            reopened
                .contains_punch(&punch("1001", at(8, 0)).key())
                .await
                .unwrap()
        );

        // The open interval is still enforced after reload
        assert!(
            reopened
                .create_interval(NewInterval {
                    employee_id: alice.id,
                    check_in: at(9, 0),
                    check_out: None,
                })
                .await
                .is_err()
        );
    }
}
