use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use common::{
    engine, Assignment, CompleteTaskRequest, CompleteTaskResponse, JobProgress, JobResults,
};
use tracing::warn;

use crate::ledger::TaskLedger;

/// Coordinador del job. Se clona barato (Arc) para pasarlo a axum y al loop
/// de failover; todas las copias comparten el mismo ledger.
///
/// Cada operación toma el lock del ledger una sola vez y lo mantiene hasta
/// terminar, así ninguna operación se intercala con otra.
#[derive(Clone)]
pub struct Coordinator {
    ledger: Arc<Mutex<TaskLedger>>,
    output_dir: Arc<PathBuf>,
}

impl Coordinator {
    pub fn new(
        files: Vec<String>,
        n_reduce: usize,
        lease_timeout: Duration,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(TaskLedger::new(files, n_reduce, lease_timeout))),
            output_dir: Arc::new(output_dir),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, TaskLedger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn ask_task(&self) -> Assignment {
        self.ledger().ask_task(Instant::now())
    }

    /// Nunca falla: un reporte inválido o viejo se descarta con
    /// `accepted = false`.
    pub fn complete_task(&self, req: &CompleteTaskRequest) -> CompleteTaskResponse {
        let mut ledger = self.ledger();
        let outcome = match req {
            CompleteTaskRequest::Map(result) => ledger.complete_map(result),
            CompleteTaskRequest::Reduce(result) => ledger.complete_reduce(result),
        };

        match outcome {
            Ok(()) => CompleteTaskResponse { accepted: true },
            Err(rejection) => {
                warn!("reporte de tarea descartado: {}", rejection);
                CompleteTaskResponse { accepted: false }
            }
        }
    }

    /// `Done()`: recupera leases vencidos y responde si el job terminó.
    pub fn done(&self) -> bool {
        self.ledger().done(Instant::now())
    }

    pub fn reclaim_expired(&self) -> usize {
        self.ledger().reclaim_expired(Instant::now())
    }

    /// Avance del job, después del mismo barrido que hace `done()`.
    pub fn progress(&self) -> JobProgress {
        let mut ledger = self.ledger();
        ledger.done(Instant::now());
        ledger.progress()
    }

    /// Outputs publicados. Se usa la ruta que reportó cada worker; los
    /// reportes sin ruta caen en `output_dir`.
    pub fn results(&self) -> JobResults {
        let completed = self.ledger().completed_outputs();
        let files = completed
            .into_iter()
            .map(|(i, reported)| {
                reported.unwrap_or_else(|| {
                    engine::output_path(&self.output_dir, i)
                        .to_string_lossy()
                        .to_string()
                })
            })
            .collect();

        JobResults {
            output_dir: self.output_dir.to_string_lossy().to_string(),
            files,
        }
    }
}
