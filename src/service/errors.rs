use thiserror::Error;

use crate::repository::StoreError;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Vehicle already registered: {0}")]
    AlreadyRegistered(String),

    /// Plate or owner name is blank once trimmed.
    #[error("Vehicle {0} is missing an owner name")]
    MissingOwner(String),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("No active entry found for vehicle {0}")]
    NoActiveEntry(String),

    /// The entry log was closed by someone else between lookup and update.
    #[error("Entry {0} was already closed")]
    EntryAlreadyClosed(String),

    #[error("Failed to record exit for {plate}: {source}")]
    ExitNotRecorded { plate: String, source: StoreError },

    #[error(transparent)]
    Store(#[from] StoreError),
}
