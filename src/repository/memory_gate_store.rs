//! In-memory `GateStore` for development runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GateStore, StoreError};
use crate::models::{EntryLog, NewEntryLog, Vehicle};

#[derive(Default)]
struct State {
    /// Keyed by plate, so iteration is already in plate order.
    vehicles: BTreeMap<String, Vehicle>,
    entry_logs: Vec<EntryLog>,
}

#[derive(Clone, Default)]
pub struct InMemoryGateStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryGateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed entry log, e.g. one backdated for a test.
    pub async fn insert_entry_log(&self, log: EntryLog) {
        self.state.write().await.entry_logs.push(log);
    }

    pub async fn entry_log(&self, id: &str) -> Option<EntryLog> {
        let state = self.state.read().await;
        state.entry_logs.iter().find(|log| log.id == id).cloned()
    }

    pub async fn entry_log_count(&self) -> usize {
        self.state.read().await.entry_logs.len()
    }
}

// Newest entry first; logs without an entry time sort last.
fn newest_first(logs: &mut [EntryLog]) {
    logs.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
}

#[async_trait]
impl GateStore for InMemoryGateStore {
    async fn get_vehicle(&self, plate: &str) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.state.read().await.vehicles.get(plate).cloned())
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self.state.read().await.vehicles.values().cloned().collect())
    }

    async fn put_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .vehicles
            .insert(vehicle.plate_number.clone(), vehicle.clone());
        Ok(())
    }

    async fn delete_vehicle(&self, plate: &str) -> Result<bool, StoreError> {
        Ok(self.state.write().await.vehicles.remove(plate).is_some())
    }

    async fn count_entries_since(
        &self,
        plate: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        let count = state
            .entry_logs
            .iter()
            .filter(|log| log.plate_number == plate)
            .filter(|log| log.entry_time.map_or(false, |t| t >= since))
            .count();
        Ok(count as i64)
    }

    async fn list_recent_entries(
        &self,
        plate: &str,
        limit: i64,
    ) -> Result<Vec<EntryLog>, StoreError> {
        let mut logs = self.list_entries_for_plate(plate).await?;
        logs.truncate(limit.max(0) as usize);
        Ok(logs)
    }

    async fn list_entries_for_plate(&self, plate: &str) -> Result<Vec<EntryLog>, StoreError> {
        let state = self.state.read().await;
        let mut logs: Vec<EntryLog> = state
            .entry_logs
            .iter()
            .filter(|log| log.plate_number == plate)
            .cloned()
            .collect();
        newest_first(&mut logs);
        Ok(logs)
    }

    async fn create_entry_log(&self, entry: &NewEntryLog) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.state
            .write()
            .await
            .entry_logs
            .push(entry.clone().into_entry_log(id.clone()));
        Ok(id)
    }

    async fn find_active_entry_log(&self, plate: &str) -> Result<Option<EntryLog>, StoreError> {
        let mut logs = self.list_entries_for_plate(plate).await?;
        logs.retain(EntryLog::is_active);
        Ok(logs.into_iter().next())
    }

    async fn update_entry_log(
        &self,
        id: &str,
        exit_time: DateTime<Utc>,
        duration_minutes: f64,
        is_suspicious: bool,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state
            .entry_logs
            .iter_mut()
            .find(|log| log.id == id && log.is_active())
        {
            Some(log) => {
                log.exit_time = Some(exit_time);
                log.duration_minutes = Some(duration_minutes);
                log.is_suspicious = is_suspicious;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_all_entry_logs(&self, limit: i64) -> Result<Vec<EntryLog>, StoreError> {
        let mut logs = self.state.read().await.entry_logs.clone();
        newest_first(&mut logs);
        logs.truncate(limit.max(0) as usize);
        Ok(logs)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
