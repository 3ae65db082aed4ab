//! Punch normalization
//!
//! Terminals report wall-clock time in the zone they are installed in. The
//! ledger keeps UTC, so every punch is resolved against the configured zone
//! before anything else looks at it.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use zkattend_types::AttendanceRecord;

use crate::error::RecordError;
use crate::model::{CanonicalPunch, EmployeeId};

/// Zone used when none is configured
pub const FALLBACK_ZONE: Tz = chrono_tz::GMT;

/// What a punch means for the attendance timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    CheckIn,
    CheckOut,

    /// Break and other codes, kept in the raw log only
    Other(u8),
}

impl Intent {
    /// Overtime codes fold into plain check-in and check-out
    pub fn from_code(code: u8) -> Self {
        match code {
            0 | 4 => Intent::CheckIn,
            1 | 5 => Intent::CheckOut,
            other => Intent::Other(other),
        }
    }

    pub fn is_attendance(&self) -> bool {
        !matches!(self, Intent::Other(_))
    }
}

/// A punch with its time resolved to UTC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPunch {
    pub device_user_id: String,
    pub at: DateTime<Utc>,
    pub intent: Intent,
    pub punch_code: u8,
    pub status: u8,
}

impl NormalizedPunch {
    pub fn for_employee(&self, employee_id: EmployeeId) -> CanonicalPunch {
        CanonicalPunch {
            employee_id,
            at: self.at,
            intent: self.intent,
        }
    }
}

pub fn normalize(record: &AttendanceRecord, zone: Tz) -> Result<NormalizedPunch, RecordError> {
    let at = to_utc(record.timestamp, zone).ok_or_else(|| RecordError::Normalize {
        user_id: record.user_id.clone(),
        local: record.timestamp,
        zone,
    })?;

    Ok(NormalizedPunch {
        device_user_id: record.user_id.clone(),
        at,
        intent: Intent::from_code(record.punch),
        punch_code: record.punch,
        status: record.status,
    })
}

/// None for local times a DST transition skips or repeats
pub fn to_utc(local: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&local)
        .single()
        .map(|at| at.with_timezone(&Utc))
}

/// Wall-clock time in `zone`, as the terminal displays it
pub fn to_local(at: DateTime<Utc>, zone: Tz) -> NaiveDateTime {
    at.with_timezone(&zone).naive_local()
}

/// Parse an IANA zone name, falling back to GMT when absent
pub fn parse_zone(name: Option<&str>) -> Result<Tz, String> {
    match name {
        None => Ok(FALLBACK_ZONE),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| format!("unknown time zone '{}'", name)),
    }
}
