use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One visit of a plate: created at the entry gate, closed once at the exit gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryLog {
    pub id: String,
    pub plate_number: String,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
    /// Registration status captured at entry time.
    pub is_registered: bool,
    pub is_suspicious: bool,
    pub suspicious_reason: Option<String>,
}

impl EntryLog {
    /// The vehicle is still inside.
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// Fields written by `GateStore::create_entry_log`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntryLog {
    pub plate_number: String,
    pub entry_time: DateTime<Utc>,
    pub is_registered: bool,
    pub is_suspicious: bool,
    pub suspicious_reason: Option<String>,
}

impl NewEntryLog {
    pub fn into_entry_log(self, id: String) -> EntryLog {
        EntryLog {
            id,
            plate_number: self.plate_number,
            entry_time: Some(self.entry_time),
            exit_time: None,
            duration_minutes: None,
            is_registered: self.is_registered,
            is_suspicious: self.is_suspicious,
            suspicious_reason: self.suspicious_reason,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EntryLogRow {
    pub id: Uuid,
    pub plate_number: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
    pub is_registered: Option<bool>,
    pub is_suspicious: Option<bool>,
    pub suspicious_reason: Option<String>,
}

impl From<EntryLogRow> for EntryLog {
    fn from(row: EntryLogRow) -> Self {
        Self {
            id: row.id.to_string(),
            plate_number: row.plate_number.unwrap_or_default(),
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            duration_minutes: row.duration_minutes,
            is_registered: row.is_registered.unwrap_or(false),
            is_suspicious: row.is_suspicious.unwrap_or(false),
            suspicious_reason: row.suspicious_reason.filter(|r| !r.is_empty()),
        }
    }
}

/// An entry log together with its display strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryLogView {
    #[serde(flatten)]
    pub log: EntryLog,
    pub duration_formatted: String,
    pub time_ago: String,
    pub entry_time_formatted: Option<String>,
    pub exit_time_formatted: Option<String>,
}
