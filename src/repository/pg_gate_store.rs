use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{GateStore, StoreError};
use crate::models::{EntryLog, EntryLogRow, NewEntryLog, Vehicle, VehicleRow};

const ENTRY_LOG_COLUMNS: &str = "id, plate_number, entry_time, exit_time, duration_minutes, \
                                 is_registered, is_suspicious, suspicious_reason";

#[derive(Clone)]
pub struct PgGateStore {
    pool: PgPool,
}

impl PgGateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_id(id: &str) -> Result<Uuid, StoreError> {
        Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
    }
}

#[async_trait]
impl GateStore for PgGateStore {
    async fn get_vehicle(&self, plate: &str) -> Result<Option<Vehicle>, StoreError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            "SELECT plate_number, owner_name, vehicle_type, registered_date FROM vehicles WHERE plate_number = $1",
        )
        .bind(plate)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT plate_number, owner_name, vehicle_type, registered_date FROM vehicles ORDER BY plate_number ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    async fn put_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO vehicles (plate_number, owner_name, vehicle_type, registered_date)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (plate_number) DO UPDATE
             SET owner_name = EXCLUDED.owner_name,
                 vehicle_type = EXCLUDED.vehicle_type,
                 registered_date = EXCLUDED.registered_date",
        )
        .bind(&vehicle.plate_number)
        .bind(&vehicle.owner_name)
        .bind(&vehicle.vehicle_type)
        .bind(vehicle.registered_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_vehicle(&self, plate: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE plate_number = $1")
            .bind(plate)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_entries_since(
        &self,
        plate: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM entry_logs WHERE plate_number = $1 AND entry_time >= $2",
        )
        .bind(plate)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_recent_entries(
        &self,
        plate: &str,
        limit: i64,
    ) -> Result<Vec<EntryLog>, StoreError> {
        let query = format!(
            "SELECT {} FROM entry_logs WHERE plate_number = $1
             ORDER BY entry_time DESC NULLS LAST LIMIT $2",
            ENTRY_LOG_COLUMNS
        );
        let rows = sqlx::query_as::<_, EntryLogRow>(&query)
            .bind(plate)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(EntryLog::from).collect())
    }

    async fn list_entries_for_plate(&self, plate: &str) -> Result<Vec<EntryLog>, StoreError> {
        let query = format!(
            "SELECT {} FROM entry_logs WHERE plate_number = $1 ORDER BY entry_time DESC NULLS LAST",
            ENTRY_LOG_COLUMNS
        );
        let rows = sqlx::query_as::<_, EntryLogRow>(&query)
            .bind(plate)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(EntryLog::from).collect())
    }

    async fn create_entry_log(&self, entry: &NewEntryLog) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO entry_logs (id, plate_number, entry_time, exit_time, duration_minutes,
                                     is_registered, is_suspicious, suspicious_reason)
             VALUES ($1, $2, $3, NULL, NULL, $4, $5, $6)",
        )
        .bind(id)
        .bind(&entry.plate_number)
        .bind(entry.entry_time)
        .bind(entry.is_registered)
        .bind(entry.is_suspicious)
        .bind(&entry.suspicious_reason)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn find_active_entry_log(&self, plate: &str) -> Result<Option<EntryLog>, StoreError> {
        let query = format!(
            "SELECT {} FROM entry_logs WHERE plate_number = $1 AND exit_time IS NULL
             ORDER BY entry_time DESC NULLS LAST LIMIT 1",
            ENTRY_LOG_COLUMNS
        );
        let row = sqlx::query_as::<_, EntryLogRow>(&query)
            .bind(plate)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EntryLog::from))
    }

    async fn update_entry_log(
        &self,
        id: &str,
        exit_time: DateTime<Utc>,
        duration_minutes: f64,
        is_suspicious: bool,
    ) -> Result<bool, StoreError> {
        let id = Self::parse_id(id)?;
        let result = sqlx::query(
            "UPDATE entry_logs SET exit_time = $1, duration_minutes = $2, is_suspicious = $3
             WHERE id = $4 AND exit_time IS NULL",
        )
        .bind(exit_time)
        .bind(duration_minutes)
        .bind(is_suspicious)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_all_entry_logs(&self, limit: i64) -> Result<Vec<EntryLog>, StoreError> {
        let query = format!(
            "SELECT {} FROM entry_logs ORDER BY entry_time DESC NULLS LAST LIMIT $1",
            ENTRY_LOG_COLUMNS
        );
        let rows = sqlx::query_as::<_, EntryLogRow>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(EntryLog::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
