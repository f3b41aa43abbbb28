pub mod errors;
pub mod format;
pub mod gate_decision;
pub mod plate;


pub use errors::GateError;
pub use format::{entry_log_view, format_duration, format_relative_time, format_timestamp};
pub use gate_decision::{compute_exit, ExitComputation, GateDecisionEngine};
pub use plate::normalize_plate;
