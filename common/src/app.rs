use std::sync::Arc;

use crate::indexer::InvertedIndex;
use crate::task::KeyValue;
use crate::wordcount::WordCount;

/// Funciones de negocio de un job map-reduce. Deben ser puras: el mismo
/// input produce el mismo output, porque una tarea puede ejecutarse más de
/// una vez.
pub trait MapReduceApp: Send + Sync {
    fn name(&self) -> &'static str;

    /// `filename` es la ruta del archivo de entrada y `contents` su texto.
    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue>;

    /// Recibe todos los valores de una clave y devuelve el valor final.
    fn reduce(&self, key: &str, values: &[String]) -> String;
}

pub const APP_NAMES: &[&str] = &["wc", "indexer"];

/// Busca una app incluida por nombre (lo que recibe el worker en `--app`).
pub fn app_by_name(name: &str) -> Option<Arc<dyn MapReduceApp>> {
    match name {
        "wc" | "wordcount" => Some(Arc::new(WordCount)),
        "indexer" => Some(Arc::new(InvertedIndex)),
        _ => None,
    }
}
