use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{AttendanceInterval, Employee, RawPunch};

/// Serialized form of a whole ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub employees: Vec<Employee>,
    pub intervals: Vec<AttendanceInterval>,
    pub punches: Vec<RawPunch>,
}

impl Snapshot {
    /// Empty snapshot when the file does not exist yet
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write beside the target, then rename over it
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
