use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::errors::GateError;
use super::format::{entry_log_view, format_duration, format_timestamp};
use super::plate::normalize_plate;
use crate::config::GateRules;
use crate::constants::{
    API_NAME, ENTRY_LOGGED, ENTRY_NOT_LOGGED, EXIT_RECORDED, REGISTERED_VEHICLE,
    UNKNOWN, UNREGISTERED_VEHICLE,
};
use crate::models::{EntryCheck, EntryLog, ExitRecord, FrequencyFlag, NewEntryLog, Vehicle};
use crate::repository::GateStore;

/// Duration and flags derived for a closed visit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitComputation {
    pub duration_minutes: f64,
    pub overstayed: bool,
    pub is_suspicious: bool,
}

/// Fractional minutes between entry and exit; overstay adds to, never clears,
/// the flag set at entry.
pub fn compute_exit(
    entry_time: DateTime<Utc>,
    exit_time: DateTime<Utc>,
    flagged_at_entry: bool,
    overstay_threshold_minutes: f64,
) -> ExitComputation {
    let duration_minutes = (exit_time - entry_time).num_milliseconds() as f64 / 60_000.0;
    let overstayed = duration_minutes > overstay_threshold_minutes;
    ExitComputation {
        duration_minutes,
        overstayed,
        is_suspicious: overstayed || flagged_at_entry,
    }
}

fn describe_window(minutes: i64) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m > 0 && m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{} minutes", m),
    }
}

fn entry_message(is_registered: bool, flag: &FrequencyFlag) -> String {
    if flag.is_suspicious {
        format!("⚠️ RED FLAG: {}", flag.reason)
    } else if !is_registered {
        UNREGISTERED_VEHICLE.to_string()
    } else {
        REGISTERED_VEHICLE.to_string()
    }
}

/// Registration, suspicion and duration rules for the entry and exit gates.
///
/// Holds no state besides the store handle and the rules, so clones are cheap
/// and can be shared across request handlers.
#[derive(Clone)]
pub struct GateDecisionEngine {
    store: Arc<dyn GateStore>,
    rules: GateRules,
}

impl GateDecisionEngine {
    pub fn new(store: Arc<dyn GateStore>, rules: GateRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> &GateRules {
        &self.rules
    }

    pub async fn is_registered(&self, plate: &str) -> Option<Vehicle> {
        let plate = normalize_plate(plate);
        match self.store.get_vehicle(&plate).await {
            Ok(vehicle) => vehicle,
            Err(e) => {
                tracing::warn!("{} Registration lookup failed for {}: {}", API_NAME, plate, e);
                None
            }
        }
    }

    /// Flags unregistered plates that already entered inside the short window,
    /// or failing that, inside the long one. Registered plates are never flagged.
    pub async fn check_frequency(&self, plate: &str, is_registered: bool) -> FrequencyFlag {
        if is_registered {
            return FrequencyFlag::clear();
        }
        let plate = normalize_plate(plate);
        let now = Utc::now();

        let short = self.rules.short_window_minutes;
        match self.count_since(&plate, now - Duration::minutes(short)).await {
            Some(count) if count >= 1 => {
                return FrequencyFlag::flagged(format!(
                    "Entered more than 1 time in last {}",
                    describe_window(short)
                ));
            }
            Some(_) => {}
            None => return FrequencyFlag::clear(),
        }

        let long = self.rules.long_window_minutes;
        match self.count_since(&plate, now - Duration::minutes(long)).await {
            Some(count) if count >= 1 => FrequencyFlag::flagged(format!(
                "Entered 2+ times in last {}",
                describe_window(long)
            )),
            _ => FrequencyFlag::clear(),
        }
    }

    async fn count_since(&self, plate: &str, since: DateTime<Utc>) -> Option<i64> {
        match self.store.count_entries_since(plate, since).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("{} Frequency check failed for {}: {}", API_NAME, plate, e);
                None
            }
        }
    }

    /// The most recent visits of a plate, newest first.
    pub async fn past_entries(&self, plate: &str) -> Vec<EntryLog> {
        let plate = normalize_plate(plate);
        self.store
            .list_recent_entries(&plate, self.rules.past_entries_limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{} Failed to load past entries for {}: {}", API_NAME, plate, e);
                Vec::new()
            })
    }

    /// Write a new entry log. A failed write is retried exactly once after the
    /// configured delay; `None` means the entry was not logged.
    pub async fn log_entry(
        &self,
        plate: &str,
        is_registered: bool,
        is_suspicious: bool,
        reason: &str,
    ) -> Option<String> {
        let entry = NewEntryLog {
            plate_number: normalize_plate(plate),
            entry_time: Utc::now(),
            is_registered,
            is_suspicious,
            suspicious_reason: (!reason.is_empty()).then(|| reason.to_string()),
        };

        match self.store.create_entry_log(&entry).await {
            Ok(id) => {
                tracing::info!("{} Logged entry {} for {}", API_NAME, id, entry.plate_number);
                return Some(id);
            }
            Err(e) => {
                tracing::warn!(
                    "{} Entry write failed for {}, retrying in {:?}: {}",
                    API_NAME,
                    entry.plate_number,
                    self.rules.entry_retry_delay,
                    e
                );
            }
        }

        tokio::time::sleep(self.rules.entry_retry_delay).await;

        match self.store.create_entry_log(&entry).await {
            Ok(id) => {
                tracing::info!("{} Logged entry {} for {} on retry", API_NAME, id, entry.plate_number);
                Some(id)
            }
            Err(e) => {
                tracing::error!("{} Entry for {} was not logged: {}", API_NAME, entry.plate_number, e);
                None
            }
        }
    }

    pub async fn find_active_entry(&self, plate: &str) -> Option<EntryLog> {
        let plate = normalize_plate(plate);
        match self.store.find_active_entry_log(&plate).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("{} Active entry lookup failed for {}: {}", API_NAME, plate, e);
                None
            }
        }
    }

    /// Close `entry` at `exit_time`. An entry without an entry time is closed
    /// with zero duration.
    pub async fn log_exit(
        &self,
        entry: &EntryLog,
        exit_time: DateTime<Utc>,
    ) -> Result<ExitRecord, GateError> {
        let entry_time = entry.entry_time.unwrap_or(exit_time);
        let exit = compute_exit(
            entry_time,
            exit_time,
            entry.is_suspicious,
            self.rules.overstay_threshold_minutes,
        );

        match self
            .store
            .update_entry_log(&entry.id, exit_time, exit.duration_minutes, exit.is_suspicious)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("{} Entry {} was closed concurrently", API_NAME, entry.id);
                return Err(GateError::EntryAlreadyClosed(entry.id.clone()));
            }
            Err(source) => {
                tracing::error!("{} Failed to record exit for {}: {}", API_NAME, entry.plate_number, source);
                return Err(GateError::ExitNotRecorded {
                    plate: entry.plate_number.clone(),
                    source,
                });
            }
        }

        let duration_formatted = format_duration(Some(exit.duration_minutes));
        let message = if exit.overstayed {
            format!(
                "⚠️ SUSPICIOUS: Stayed {} (>{}min)",
                duration_formatted, self.rules.overstay_threshold_minutes
            )
        } else {
            EXIT_RECORDED.to_string()
        };

        tracing::info!(
            "{} Recorded exit for {} after {:.1} minutes (suspicious: {})",
            API_NAME,
            entry.plate_number,
            exit.duration_minutes,
            exit.is_suspicious
        );

        let offset = self.rules.display_offset();
        Ok(ExitRecord {
            entry_log_id: entry.id.clone(),
            plate_number: entry.plate_number.clone(),
            entry_time,
            exit_time,
            entry_time_formatted: format_timestamp(entry_time, &offset),
            exit_time_formatted: format_timestamp(exit_time, &offset),
            duration_minutes: exit.duration_minutes,
            duration_formatted,
            overstayed: exit.overstayed,
            is_suspicious: exit.is_suspicious,
            message,
        })
    }

    /// Entry gate workflow: look up the plate, apply the frequency rule,
    /// collect recent history and log the entry.
    pub async fn check_entry(&self, plate: &str) -> EntryCheck {
        let plate = normalize_plate(plate);
        tracing::info!("{} Checking entry for {}", API_NAME, plate);

        let vehicle = self.is_registered(&plate).await;
        let is_registered = vehicle.is_some();
        let flag = self.check_frequency(&plate, is_registered).await;
        // History is read before the new entry exists.
        let past_entries = self.past_entries(&plate).await;
        let entry_log_id = self
            .log_entry(&plate, is_registered, flag.is_suspicious, &flag.reason)
            .await;

        let status = if entry_log_id.is_some() {
            ENTRY_LOGGED
        } else {
            ENTRY_NOT_LOGGED
        };
        let now = Utc::now();
        let offset = self.rules.display_offset();

        EntryCheck {
            message: entry_message(is_registered, &flag),
            status: status.to_string(),
            past_entries: past_entries
                .into_iter()
                .map(|log| entry_log_view(log, now, &offset))
                .collect(),
            plate_number: plate,
            is_registered,
            vehicle,
            is_suspicious: flag.is_suspicious,
            suspicious_reason: flag.reason,
            entry_log_id,
        }
    }

    /// Exit gate workflow.
    pub async fn record_exit(&self, plate: &str) -> Result<ExitRecord, GateError> {
        let plate = normalize_plate(plate);
        tracing::info!("{} Processing exit for {}", API_NAME, plate);

        let entry = self
            .find_active_entry(&plate)
            .await
            .ok_or_else(|| GateError::NoActiveEntry(plate.clone()))?;
        self.log_exit(&entry, Utc::now()).await
    }

    /// Register a vehicle. An existing registration is never overwritten.
    pub async fn add_vehicle(
        &self,
        plate: &str,
        owner_name: &str,
        vehicle_type: Option<&str>,
    ) -> Result<Vehicle, GateError> {
        let plate = normalize_plate(plate);
        let owner_name = owner_name.trim();
        if plate.is_empty() || owner_name.is_empty() {
            return Err(GateError::MissingOwner(plate));
        }

        if self.store.get_vehicle(&plate).await?.is_some() {
            tracing::warn!("{} Vehicle already registered: {}", API_NAME, plate);
            return Err(GateError::AlreadyRegistered(plate));
        }

        let vehicle_type = vehicle_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN);
        let vehicle = Vehicle::new(plate, owner_name.to_string(), vehicle_type.to_string());

        self.store.put_vehicle(&vehicle).await.map_err(|e| {
            tracing::error!("{} Failed to add vehicle {}: {}", API_NAME, vehicle.plate_number, e);
            GateError::from(e)
        })?;

        tracing::info!("{} Registered vehicle {}", API_NAME, vehicle.plate_number);
        Ok(vehicle)
    }

    pub async fn delete_vehicle(&self, plate: &str) -> Result<(), GateError> {
        let plate = normalize_plate(plate);
        let deleted = self.store.delete_vehicle(&plate).await.map_err(|e| {
            tracing::error!("{} Failed to delete vehicle {}: {}", API_NAME, plate, e);
            GateError::from(e)
        })?;

        if !deleted {
            return Err(GateError::VehicleNotFound(plate));
        }
        tracing::info!("{} Removed vehicle {}", API_NAME, plate);
        Ok(())
    }

    pub async fn list_vehicles(&self) -> Vec<Vehicle> {
        self.store.list_vehicles().await.unwrap_or_else(|e| {
            tracing::warn!("{} Failed to list vehicles: {}", API_NAME, e);
            Vec::new()
        })
    }

    /// Unlike the other listings, a store failure here reaches the caller.
    pub async fn list_logs(&self, limit: Option<i64>) -> Result<Vec<EntryLog>, GateError> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.rules.default_log_limit);
        self.store.list_all_entry_logs(limit).await.map_err(|e| {
            tracing::error!("{} Failed to load entry logs: {}", API_NAME, e);
            GateError::from(e)
        })
    }

    pub async fn history(&self, plate: &str) -> Vec<EntryLog> {
        let plate = normalize_plate(plate);
        self.store
            .list_entries_for_plate(&plate)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{} Failed to load history for {}: {}", API_NAME, plate, e);
                Vec::new()
            })
    }

    pub async fn store_healthy(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{} Store health check failed: {}", API_NAME, e);
                false
            }
        }
    }
}
