//! Worker map-reduce: pide tareas al coordinador, las ejecuta y reporta.

pub mod client;
pub mod executor;
pub mod worker;

pub use client::CoordinatorClient;
pub use worker::{Step, Worker, WorkerConfig};
