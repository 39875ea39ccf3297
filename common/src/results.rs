use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResults {
    /// Directorio donde quedan los outputs del job
    pub output_dir: String,
    /// Archivos de salida de los reduces ya terminados, en orden de partición
    pub files: Vec<String>,
}
