use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{EntryLogView, Vehicle};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateRequest {
    pub plate_number: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    pub plate_number: String,
    #[validate(length(min = 1, message = "Please fill plate number and owner name"))]
    pub owner_name: String,
    #[serde(default)]
    pub vehicle_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub new_password: String,
}

/// Outcome of the frequency rule for one entry attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyFlag {
    pub is_suspicious: bool,
    /// Empty when not suspicious.
    pub reason: String,
}

impl FrequencyFlag {
    pub fn clear() -> Self {
        Self {
            is_suspicious: false,
            reason: String::new(),
        }
    }

    pub fn flagged(reason: String) -> Self {
        Self {
            is_suspicious: true,
            reason,
        }
    }
}

/// Result of the entry workflow, shown to the attendant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCheck {
    pub plate_number: String,
    pub is_registered: bool,
    pub vehicle: Option<Vehicle>,
    pub is_suspicious: bool,
    pub suspicious_reason: String,
    pub past_entries: Vec<EntryLogView>,
    /// Id of the new entry log; absent when the write failed twice.
    pub entry_log_id: Option<String>,
    pub message: String,
    pub status: String,
}

impl EntryCheck {
    pub fn logged(&self) -> bool {
        self.entry_log_id.is_some()
    }
}

/// Result of a recorded exit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRecord {
    pub entry_log_id: String,
    pub plate_number: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_time_formatted: String,
    pub exit_time_formatted: String,
    pub duration_minutes: f64,
    pub duration_formatted: String,
    /// The overstay rule fired for this visit.
    pub overstayed: bool,
    /// Flag stored on the log: overstay or the flag set at entry.
    pub is_suspicious: bool,
    pub message: String,
}
