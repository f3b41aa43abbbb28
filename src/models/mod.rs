pub mod entry_log;
pub mod gate;
pub mod vehicle;

pub use entry_log::{EntryLog, EntryLogRow, EntryLogView, NewEntryLog};
pub use gate::{
    EntryCheck, ExitRecord, FrequencyFlag, LogsQuery, PasswordRequest, PlateRequest,
    VehicleRequest,
};
pub use vehicle::{Vehicle, VehicleRow};
