use crate::error::StoreResult;
use crate::model::{EmployeeId, RawPunch};
use crate::normalize::NormalizedPunch;
use crate::store::RawPunchStore;

/// Appends accepted punches to the audit log of one terminal
pub struct RawLogWriter<'a, S: RawPunchStore + ?Sized> {
    store: &'a S,
    device: &'a str,
    location: Option<&'a str>,
}

impl<'a, S: RawPunchStore + ?Sized> RawLogWriter<'a, S> {
    pub fn new(store: &'a S, device: &'a str, location: Option<&'a str>) -> Self {
        Self {
            store,
            device,
            location,
        }
    }

    pub async fn append(&self, punch: &NormalizedPunch, employee_id: EmployeeId) -> StoreResult<RawPunch> {
        let entry = RawPunch {
            device_user_id: punch.device_user_id.clone(),
            timestamp: punch.at,
            punch_type: punch.punch_code.to_string(),
            status: punch.status.to_string(),
            device: self.device.to_string(),
            location: self.location.map(str::to_string),
            employee_id,
        };
        self.store.append_punch(entry.clone()).await?;
        Ok(entry)
    }
}
