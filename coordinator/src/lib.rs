//! Coordinador map-reduce: ledger de tareas, API HTTP y failover por leases.

pub mod failover;
pub mod handlers;
pub mod ledger;
pub mod state;

pub use state::Coordinator;
