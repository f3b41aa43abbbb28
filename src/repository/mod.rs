pub mod errors;
pub mod gate_store;
pub mod memory_gate_store;
pub mod pg_gate_store;

pub use errors::StoreError;
pub use gate_store::GateStore;
pub use memory_gate_store::InMemoryGateStore;
pub use pg_gate_store::PgGateStore;
