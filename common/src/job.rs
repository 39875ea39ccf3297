use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Quedan maps sin terminar
    Mapping,
    /// Todos los maps terminados, quedan reduces
    Reducing,
    Succeeded,
}

/// Foto del avance del job que expone el coordinador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub status: JobStatus,
    pub done: bool,
    pub reduce_count: usize,

    /// -------- Métricas del job --------
    pub map_total: usize,
    pub maps_completed: usize,
    pub reduce_total: usize,
    pub reduces_completed: usize,
    pub tasks_in_progress: usize,
    /// Leases vencidos que se devolvieron a Idle
    pub reassignments: u64,
    /// Reportes de fin descartados por epoch viejo
    pub stale_reports: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
