//! Tipos y utilidades compartidas entre coordinador, workers y cliente.

pub mod app;
pub mod config;
pub mod engine;
pub mod indexer;
pub mod job;
pub mod results;
pub mod rpc;
pub mod task;
pub mod wordcount;

/* --------- Re-exports para que los binarios usen `common::X` --------- */

pub use app::{app_by_name, MapReduceApp, APP_NAMES};
pub use job::{JobProgress, JobStatus};
pub use results::JobResults;
pub use rpc::{
    AskTaskRequest, AskTaskResponse, Assignment, CompleteTaskRequest, CompleteTaskResponse,
    MapResult, ReduceResult,
};
pub use task::{Epoch, KeyValue, MapTaskSpec, ReduceTaskSpec, TaskIndex, TaskKind, TaskStatus};
