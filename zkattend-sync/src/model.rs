//! Ledger entities

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::Intent;

/// Employee identity in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "employee#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,

    /// Terminal user id this employee punches as; unique across employees
    pub device_user_id: Option<String>,
}

/// Employee to be created for a terminal user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub device_user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalId(pub u64);

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interval#{}", self.0)
    }
}

/// A check-in, optionally closed by a check-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceInterval {
    pub id: IntervalId,
    pub employee_id: EmployeeId,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

impl AttendanceInterval {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }
}

/// Interval to be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewInterval {
    pub employee_id: EmployeeId,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

/// Identity of a punch in the raw log: no two entries share it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PunchKey {
    pub device_user_id: String,
    pub timestamp: DateTime<Utc>,
    pub device: String,
}

/// Audit record of a punch as the terminal reported it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunch {
    pub device_user_id: String,
    pub timestamp: DateTime<Utc>,

    /// Punch type code as reported, overtime codes kept distinct
    pub punch_type: String,

    pub status: String,

    /// Name of the terminal the punch came from
    pub device: String,

    /// Working location of that terminal
    pub location: Option<String>,

    pub employee_id: EmployeeId,
}

impl RawPunch {
    pub fn key(&self) -> PunchKey {
        PunchKey {
            device_user_id: self.device_user_id.clone(),
            timestamp: self.timestamp,
            device: self.device.clone(),
        }
    }
}

/// Normalized punch bound to an employee, input of the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalPunch {
    pub employee_id: EmployeeId,
    pub at: DateTime<Utc>,
    pub intent: Intent,
}
