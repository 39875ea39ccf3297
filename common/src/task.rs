use serde::{Deserialize, Serialize};

/// Índice de una tarea: para map es la posición del archivo de entrada,
/// para reduce es el número de partición.
pub type TaskIndex = usize;

/// Número de asignación de una tarea. El coordinador lo incrementa cada vez
/// que entrega la tarea a un worker, así que identifica un lease concreto.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Ciclo de vida de una tarea (map o reduce).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Sólo reduce: todavía no hay datos para ella y quedan maps sin terminar.
    Pending,
    Idle,
    InProgress,
    Completed,
}

/// Par clave/valor que producen las funciones map y consumen las reduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTaskSpec {
    pub index: TaskIndex,
    /// Ruta del archivo de entrada que procesa este map
    pub file_path: String,
    /// Cantidad de particiones (= tareas reduce) del job
    pub reduce_count: usize,
    pub epoch: Epoch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceTaskSpec {
    pub index: TaskIndex,
    /// Archivos intermedios que los maps escribieron para esta partición
    pub intermediate_files: Vec<String>,
    pub epoch: Epoch,
}
