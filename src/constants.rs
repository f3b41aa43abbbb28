pub const API_NAME: &str = "[gate-api-rust]";

/// Placeholder stored for owner name or vehicle type when a record lacks one.
pub const UNKNOWN: &str = "Unknown";

pub const ENTRY_LOGGED: &str = "✅ Entry logged successfully";
pub const ENTRY_NOT_LOGGED: &str = "⚠️ Entry check OK but log failed to save";
pub const REGISTERED_VEHICLE: &str = "✅ REGISTERED VEHICLE";
pub const UNREGISTERED_VEHICLE: &str = "❌ UNREGISTERED VEHICLE";
pub const EXIT_RECORDED: &str = "✅ Exit recorded";
pub const NO_ACTIVE_ENTRY: &str =
    "No active entry found for this vehicle. Vehicle may not have entered or already exited.";
pub const EMPTY_PLATE: &str = "Please enter a plate number";
pub const MISSING_VEHICLE_FIELDS: &str = "Please fill plate number and owner name";
