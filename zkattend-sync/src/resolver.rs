use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{RecordError, StoreError};
use crate::model::{EmployeeId, NewEmployee};
use crate::store::EmployeeStore;

/// Maps terminal users to employees, creating missing ones
///
/// Lookups are cached for the lifetime of one run.
pub struct EmployeeResolver<'a, S: EmployeeStore + ?Sized> {
    store: &'a S,
    cache: HashMap<String, EmployeeId>,
}

impl<'a, S: EmployeeStore + ?Sized> EmployeeResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    pub async fn resolve(
        &mut self,
        device_user_id: &str,
        name: &str,
    ) -> Result<EmployeeId, RecordError> {
        if let Some(id) = self.cache.get(device_user_id) {
            return Ok(*id);
        }

        let id = self
            .lookup_or_create(device_user_id, name)
            .await
            .map_err(|source| RecordError::Resolve {
                user_id: device_user_id.to_string(),
                source,
            })?;
        self.cache.insert(device_user_id.to_string(), id);
        Ok(id)
    }

    async fn lookup_or_create(&self, device_user_id: &str, name: &str) -> Result<EmployeeId, StoreError> {
        if let Some(employee) = self.store.find_employee(device_user_id).await? {
            return Ok(employee.id);
        }

        let new = NewEmployee {
            name: name.to_string(),
            device_user_id: device_user_id.to_string(),
        };
        match self.store.create_employee(new).await {
            Ok(employee) => {
                info!("Created {} '{}' for device user {}", employee.id, employee.name, device_user_id);
                Ok(employee.id)
            }
            Err(StoreError::Conflict(reason)) => {
                // Someone else created it between lookup and insert
                debug!("Employee creation raced: {}", reason);
                self.store
                    .find_employee(device_user_id)
                    .await?
                    .map(|e| e.id)
                    .ok_or(StoreError::Conflict(reason))
            }
            Err(e) => Err(e),
        }
    }
}
