use crate::error::StoreResult;
use crate::model::PunchKey;
use crate::store::RawPunchStore;

/// Drops punches the raw log already holds
pub struct DuplicateFilter<'a, S: RawPunchStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RawPunchStore + ?Sized> DuplicateFilter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn is_duplicate(&self, key: &PunchKey) -> StoreResult<bool> {
        self.store.contains_punch(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmployeeId, RawPunch};
    use crate::store::MemoryLedger;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_same_user_time_and_device_is_duplicate() {
        let ledger = MemoryLedger::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        ledger
            .append_punch(RawPunch {
                device_user_id: "1001".into(),
                timestamp: at,
                punch_type: "0".into(),
                status: "1".into(),
                device: "gate".into(),
                location: None,
                employee_id: EmployeeId(1),
            })
            .await
            .unwrap();

        let filter = DuplicateFilter::new(&ledger);
        let key = |device: &str| PunchKey {
            device_user_id: "1001".into(),
            timestamp: at,
            device: device.into(),
        };
        assert!(filter.is_duplicate(&key("gate")).await.unwrap());
        assert!(!filter.is_duplicate(&key("canteen")).await.unwrap());
    }
}
