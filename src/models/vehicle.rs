use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::UNKNOWN;

/// A registered vehicle, keyed by its normalized plate number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub plate_number: String,
    pub owner_name: String,
    pub vehicle_type: String,
    pub registered_date: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn new(plate_number: String, owner_name: String, vehicle_type: String) -> Self {
        Self {
            plate_number,
            owner_name,
            vehicle_type,
            registered_date: Some(Utc::now()),
        }
    }
}

/// Raw `vehicles` row. Columns other than the key may be null.
#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub plate_number: String,
    pub owner_name: Option<String>,
    pub vehicle_type: Option<String>,
    pub registered_date: Option<DateTime<Utc>>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Self {
            plate_number: row.plate_number,
            owner_name: row.owner_name.unwrap_or_else(|| UNKNOWN.to_string()),
            vehicle_type: row.vehicle_type.unwrap_or_else(|| UNKNOWN.to_string()),
            registered_date: row.registered_date,
        }
    }
}
