use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::StoreError;
use crate::models::{EntryLog, NewEntryLog, Vehicle};

/// Data-access port behind the gate decision engine.
///
/// Plates passed in are already normalized. Implementations report every
/// failure as a `StoreError`; deciding whether a failure degrades to an empty
/// result or reaches the caller is left to the engine.
#[async_trait]
pub trait GateStore: Send + Sync {
    async fn get_vehicle(&self, plate: &str) -> Result<Option<Vehicle>, StoreError>;

    /// All vehicles, ordered by plate number ascending.
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError>;

    /// Create or overwrite the vehicle keyed by its plate.
    async fn put_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError>;

    /// Returns `false` when no vehicle was stored under `plate`.
    async fn delete_vehicle(&self, plate: &str) -> Result<bool, StoreError>;

    /// Entry logs for `plate` whose entry time is at or after `since`.
    async fn count_entries_since(
        &self,
        plate: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Newest first.
    async fn list_recent_entries(&self, plate: &str, limit: i64)
        -> Result<Vec<EntryLog>, StoreError>;

    /// Every entry log of `plate`, newest first.
    async fn list_entries_for_plate(&self, plate: &str) -> Result<Vec<EntryLog>, StoreError>;

    /// Returns the id assigned to the new record.
    async fn create_entry_log(&self, entry: &NewEntryLog) -> Result<String, StoreError>;

    /// Most recent entry log of `plate` without an exit time.
    async fn find_active_entry_log(&self, plate: &str) -> Result<Option<EntryLog>, StoreError>;

    /// Close an active entry log.
    ///
    /// Conditional on the record still having no exit time; returns `false`
    /// when the record is missing or was already closed.
    async fn update_entry_log(
        &self,
        id: &str,
        exit_time: DateTime<Utc>,
        duration_minutes: f64,
        is_suspicious: bool,
    ) -> Result<bool, StoreError>;

    /// Newest first across all plates.
    async fn list_all_entry_logs(&self, limit: i64) -> Result<Vec<EntryLog>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
