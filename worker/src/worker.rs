use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use common::{Assignment, CompleteTaskRequest, MapResult, MapReduceApp, ReduceResult, TaskKind};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{client::CoordinatorClient, executor};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Donde se escriben intermedios y outputs
    pub work_dir: PathBuf,
    /// Espera entre pedidos cuando no hay tareas
    pub backoff: Duration,
}

/// Resultado de una vuelta del loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ran(TaskKind),
    NoTask,
}

/// Worker secuencial: una tarea a la vez.
pub struct Worker {
    client: CoordinatorClient,
    app: Arc<dyn MapReduceApp>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(client: CoordinatorClient, app: Arc<dyn MapReduceApp>, config: WorkerConfig) -> Self {
        Self {
            client,
            app,
            config,
        }
    }

    /// Pide una tarea, la ejecuta y la reporta.
    ///
    /// Cualquier error (llamada al coordinador o E/S de la tarea) se
    /// devuelve tal cual; la tarea queda en curso en el coordinador y se
    /// recupera cuando vence su lease.
    pub async fn step(&self) -> Result<Step> {
        match self.client.ask_task().await? {
            Assignment::Map(task) => {
                info!(
                    "tengo map {} (input={}, epoch={})",
                    task.index, task.file_path, task.epoch
                );

                let app = self.app.clone();
                let dir = self.config.work_dir.clone();
                let spec = task.clone();
                let files =
                    tokio::task::spawn_blocking(move || executor::run_map(app.as_ref(), &spec, &dir))
                        .await
                        .context("la tarea map terminó con pánico")??;

                let accepted = self
                    .client
                    .complete_task(&CompleteTaskRequest::Map(MapResult {
                        task_index: task.index,
                        epoch: task.epoch,
                        partition_to_file: files,
                    }))
                    .await?;
                if !accepted {
                    warn!(
                        "el coordinador descartó el map {} (epoch {}): el lease ya no era nuestro",
                        task.index, task.epoch
                    );
                }

                Ok(Step::Ran(TaskKind::Map))
            }
            Assignment::Reduce(task) => {
                info!(
                    "tengo reduce {} ({} intermedios, epoch={})",
                    task.index,
                    task.intermediate_files.len(),
                    task.epoch
                );

                let app = self.app.clone();
                let dir = self.config.work_dir.clone();
                let spec = task.clone();
                let output = tokio::task::spawn_blocking(move || {
                    executor::run_reduce(app.as_ref(), &spec, &dir)
                })
                .await
                .context("la tarea reduce terminó con pánico")??;

                let accepted = self
                    .client
                    .complete_task(&CompleteTaskRequest::Reduce(ReduceResult {
                        task_index: task.index,
                        epoch: task.epoch,
                        output_file: Some(output.to_string_lossy().to_string()),
                    }))
                    .await?;
                if !accepted {
                    warn!(
                        "el coordinador descartó el reduce {} (epoch {}): el lease ya no era nuestro",
                        task.index, task.epoch
                    );
                }

                Ok(Step::Ran(TaskKind::Reduce))
            }
            Assignment::NoTask => Ok(Step::NoTask),
        }
    }

    /// Loop infinito. Sólo vuelve si hay un error fatal (coordinador
    /// inalcanzable tras los reintentos, o E/S de una tarea).
    pub async fn run(&self) -> Result<()> {
        loop {
            if self.step().await? == Step::NoTask {
                debug!("no hay tareas, esperando {:?}...", self.config.backoff);
                sleep(self.config.backoff).await;
            }
        }
    }
}
