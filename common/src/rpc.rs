use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::{Epoch, MapTaskSpec, ReduceTaskSpec, TaskIndex};

/* --------- AskTask --------- */

/// Los workers son anónimos: pedir tarea no lleva datos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskTaskRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assignment {
    /// No hay nada que hacer ahora; el worker debe esperar y reintentar.
    #[serde(rename = "NONE")]
    NoTask,
    Map(MapTaskSpec),
    Reduce(ReduceTaskSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskTaskResponse {
    pub task: Assignment,
}

/* --------- CompleteTask --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapResult {
    pub task_index: TaskIndex,
    pub epoch: Epoch,
    /// partición -> archivo intermedio escrito para ella
    pub partition_to_file: BTreeMap<TaskIndex, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceResult {
    pub task_index: TaskIndex,
    pub epoch: Epoch,
    /// Ruta donde el worker publicó el output. Si falta, el coordinador la
    /// arma con su propio directorio de trabajo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompleteTaskRequest {
    Map(MapResult),
    Reduce(ReduceResult),
}

/// `accepted = false` significa que el reporte era de un lease viejo y se
/// descartó. No es un error para el worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTaskResponse {
    pub accepted: bool,
}
