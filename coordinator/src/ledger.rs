use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use common::{
    Assignment, Epoch, JobProgress, JobStatus, MapResult, MapTaskSpec, ReduceResult,
    ReduceTaskSpec, TaskIndex, TaskKind, TaskStatus,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct MapTask {
    file_path: String,
    status: TaskStatus,
    epoch: Epoch,
    started_at: Option<Instant>,
}

#[derive(Debug, Clone)]
struct ReduceTask {
    status: TaskStatus,
    intermediate_files: Vec<String>,
    epoch: Epoch,
    started_at: Option<Instant>,
    output_file: Option<String>,
}

/// Motivo por el que se descarta un reporte de tarea terminada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownTask(TaskKind, TaskIndex),
    AlreadyCompleted(TaskKind, TaskIndex),
    StaleEpoch { reported: Epoch, current: Epoch },
    PartitionOutOfRange(TaskIndex),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownTask(kind, i) => write!(f, "no existe la tarea {:?} {}", kind, i),
            Rejection::AlreadyCompleted(kind, i) => {
                write!(f, "la tarea {:?} {} ya estaba completada", kind, i)
            }
            Rejection::StaleEpoch { reported, current } => write!(
                f,
                "lease viejo (epoch reportado={}, actual={})",
                reported, current
            ),
            Rejection::PartitionOutOfRange(p) => write!(f, "partición {} fuera de rango", p),
        }
    }
}

/// Un reporte vale si trae el epoch del último lease y la tarea no está
/// completada. Si el lease venció pero nadie la volvió a tomar (Idle con el
/// mismo epoch) el resultado se acepta igual.
fn check_lease(
    kind: TaskKind,
    index: TaskIndex,
    status: TaskStatus,
    current: Epoch,
    reported: Epoch,
) -> Result<(), Rejection> {
    if status == TaskStatus::Completed {
        return Err(Rejection::AlreadyCompleted(kind, index));
    }
    if reported != current {
        return Err(Rejection::StaleEpoch { reported, current });
    }
    Ok(())
}

fn lease_expired(started_at: Option<Instant>, now: Instant, timeout: Duration) -> bool {
    started_at
        .map(|t| now.saturating_duration_since(t) > timeout)
        .unwrap_or(true)
}

/// Estado completo de un job: todas las tareas map y reduce.
///
/// No hace locking; el dueño (`Coordinator`) lo guarda detrás de un único
/// mutex y cada método público se ejecuta entero con el lock tomado. Los
/// métodos devuelven copias, nunca referencias a las listas internas.
#[derive(Debug)]
pub struct TaskLedger {
    n_reduce: usize,
    maps: Vec<MapTask>,
    reduces: Vec<ReduceTask>,
    lease_timeout: Duration,

    reassignments: u64,
    stale_reports: u64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TaskLedger {
    /// Un map por archivo (Idle) y `n_reduce` reduces. Los reduces arrancan
    /// en Pending hasta que algún map les entregue datos; sin archivos de
    /// entrada no hay nada que esperar y arrancan Idle.
    pub fn new(files: Vec<String>, n_reduce: usize, lease_timeout: Duration) -> Self {
        let initial_reduce = if files.is_empty() {
            TaskStatus::Idle
        } else {
            TaskStatus::Pending
        };

        let maps = files
            .into_iter()
            .map(|file_path| MapTask {
                file_path,
                status: TaskStatus::Idle,
                epoch: 0,
                started_at: None,
            })
            .collect::<Vec<_>>();

        let reduces = (0..n_reduce)
            .map(|_| ReduceTask {
                status: initial_reduce,
                intermediate_files: Vec::new(),
                epoch: 0,
                started_at: None,
                output_file: None,
            })
            .collect();

        info!(
            "job creado: {} tareas map, {} tareas reduce, lease={:?}",
            maps.len(),
            n_reduce,
            lease_timeout
        );

        let mut ledger = Self {
            n_reduce,
            maps,
            reduces,
            lease_timeout,
            reassignments: 0,
            stale_reports: 0,
            started_at: Utc::now(),
            finished_at: None,
        };
        ledger.mark_finished_if_done();
        ledger
    }

    /* ---------------- AskTask ---------------- */

    /// Primero maps en orden de índice; reduces sólo cuando todos los maps
    /// están completados (barrera de fase).
    pub fn ask_task(&mut self, now: Instant) -> Assignment {
        if let Some(spec) = self.assign_map(now) {
            return Assignment::Map(spec);
        }

        if !self.all_maps_completed() {
            debug!("no hay maps libres y quedan maps en curso, nada que asignar");
            return Assignment::NoTask;
        }

        match self.assign_reduce(now) {
            Some(spec) => Assignment::Reduce(spec),
            None => Assignment::NoTask,
        }
    }

    fn assign_map(&mut self, now: Instant) -> Option<MapTaskSpec> {
        let index = self
            .maps
            .iter()
            .position(|t| t.status == TaskStatus::Idle)?;
        let task = &mut self.maps[index];

        task.status = TaskStatus::InProgress;
        task.epoch += 1;
        task.started_at = Some(now);

        info!(
            "asignando map {} (input={}, epoch={})",
            index, task.file_path, task.epoch
        );

        Some(MapTaskSpec {
            index,
            file_path: task.file_path.clone(),
            reduce_count: self.n_reduce,
            epoch: task.epoch,
        })
    }

    fn assign_reduce(&mut self, now: Instant) -> Option<ReduceTaskSpec> {
        let index = self
            .reduces
            .iter()
            .position(|t| t.status == TaskStatus::Idle)?;
        let task = &mut self.reduces[index];

        task.status = TaskStatus::InProgress;
        task.epoch += 1;
        task.started_at = Some(now);

        info!(
            "asignando reduce {} ({} archivos intermedios, epoch={})",
            index,
            task.intermediate_files.len(),
            task.epoch
        );

        Some(ReduceTaskSpec {
            index,
            intermediate_files: task.intermediate_files.clone(),
            epoch: task.epoch,
        })
    }

    /* ---------------- CompleteTask ---------------- */

    pub fn complete_map(&mut self, result: &MapResult) -> Result<(), Rejection> {
        let index = result.task_index;
        let (status, current) = match self.maps.get(index) {
            Some(t) => (t.status, t.epoch),
            None => return Err(Rejection::UnknownTask(TaskKind::Map, index)),
        };

        if let Err(e) = check_lease(TaskKind::Map, index, status, current, result.epoch) {
            self.stale_reports += 1;
            return Err(e);
        }

        if let Some(&p) = result
            .partition_to_file
            .keys()
            .find(|p| **p >= self.n_reduce)
        {
            return Err(Rejection::PartitionOutOfRange(p));
        }

        for (partition, path) in &result.partition_to_file {
            let reduce = &mut self.reduces[*partition];
            reduce.intermediate_files.push(path.clone());
            if reduce.status == TaskStatus::Pending {
                reduce.status = TaskStatus::Idle;
            }
        }

        let task = &mut self.maps[index];
        task.status = TaskStatus::Completed;
        task.started_at = None;

        info!(
            "map {} completado ({} particiones con datos)",
            index,
            result.partition_to_file.len()
        );

        if self.all_maps_completed() {
            // Particiones que ningún map alimentó: igual producen un output vacío.
            for reduce in self.reduces.iter_mut() {
                if reduce.status == TaskStatus::Pending {
                    reduce.status = TaskStatus::Idle;
                }
            }
            info!("todos los maps completados, se habilitan los reduces");
        }

        self.mark_finished_if_done();
        Ok(())
    }

    pub fn complete_reduce(&mut self, result: &ReduceResult) -> Result<(), Rejection> {
        let index = result.task_index;
        let (status, current) = match self.reduces.get(index) {
            Some(t) => (t.status, t.epoch),
            None => return Err(Rejection::UnknownTask(TaskKind::Reduce, index)),
        };

        if let Err(e) = check_lease(TaskKind::Reduce, index, status, current, result.epoch) {
            self.stale_reports += 1;
            return Err(e);
        }

        let task = &mut self.reduces[index];
        task.status = TaskStatus::Completed;
        task.started_at = None;
        task.output_file = result.output_file.clone();

        info!("reduce {} completado", index);

        self.mark_finished_if_done();
        Ok(())
    }

    /* ---------------- Done / leases ---------------- */

    /// Devuelve a Idle toda tarea InProgress cuyo lease superó el timeout.
    /// Devuelve cuántas tareas se recuperaron.
    pub fn reclaim_expired(&mut self, now: Instant) -> usize {
        let timeout = self.lease_timeout;
        let mut reclaimed = 0;

        for (index, task) in self.maps.iter_mut().enumerate() {
            if task.status == TaskStatus::InProgress && lease_expired(task.started_at, now, timeout)
            {
                warn!(
                    "lease vencido para map {} (input={}, epoch={}), vuelve a Idle",
                    index, task.file_path, task.epoch
                );
                task.status = TaskStatus::Idle;
                task.started_at = None;
                reclaimed += 1;
            }
        }

        for (index, task) in self.reduces.iter_mut().enumerate() {
            if task.status == TaskStatus::InProgress && lease_expired(task.started_at, now, timeout)
            {
                warn!(
                    "lease vencido para reduce {} (epoch={}), vuelve a Idle",
                    index, task.epoch
                );
                task.status = TaskStatus::Idle;
                task.started_at = None;
                reclaimed += 1;
            }
        }

        self.reassignments += reclaimed as u64;
        reclaimed
    }

    /// `Done()`: barre leases vencidos y después responde si el job terminó.
    pub fn done(&mut self, now: Instant) -> bool {
        self.reclaim_expired(now);
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.all_maps_completed()
            && self
                .reduces
                .iter()
                .all(|t| t.status == TaskStatus::Completed)
    }

    fn all_maps_completed(&self) -> bool {
        self.maps.iter().all(|t| t.status == TaskStatus::Completed)
    }

    fn mark_finished_if_done(&mut self) {
        if self.finished_at.is_none() && self.is_done() {
            self.finished_at = Some(Utc::now());
            info!("job terminado");
        }
    }

    /* ---------------- Consultas ---------------- */

    pub fn map_status(&self, index: TaskIndex) -> Option<TaskStatus> {
        self.maps.get(index).map(|t| t.status)
    }

    pub fn reduce_status(&self, index: TaskIndex) -> Option<TaskStatus> {
        self.reduces.get(index).map(|t| t.status)
    }

    pub fn reduce_files(&self, index: TaskIndex) -> Option<Vec<String>> {
        self.reduces.get(index).map(|t| t.intermediate_files.clone())
    }

    pub fn completed_reduces(&self) -> Vec<TaskIndex> {
        self.reduces
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == TaskStatus::Completed)
            .map(|(i, _)| i)
            .collect()
    }

    /// Reduces completados con la ruta de output que reportó su worker.
    pub fn completed_outputs(&self) -> Vec<(TaskIndex, Option<String>)> {
        self.reduces
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == TaskStatus::Completed)
            .map(|(i, t)| (i, t.output_file.clone()))
            .collect()
    }

    pub fn progress(&self) -> JobProgress {
        let maps_completed = self
            .maps
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let reduces_completed = self.completed_reduces().len();
        let tasks_in_progress = self
            .maps
            .iter()
            .map(|t| t.status)
            .chain(self.reduces.iter().map(|t| t.status))
            .filter(|s| *s == TaskStatus::InProgress)
            .count();

        let done = self.is_done();
        let status = if done {
            JobStatus::Succeeded
        } else if maps_completed < self.maps.len() {
            JobStatus::Mapping
        } else {
            JobStatus::Reducing
        };

        JobProgress {
            status,
            done,
            reduce_count: self.n_reduce,
            map_total: self.maps.len(),
            maps_completed,
            reduce_total: self.reduces.len(),
            reduces_completed,
            tasks_in_progress,
            reassignments: self.reassignments,
            stale_reports: self.stale_reports,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}
