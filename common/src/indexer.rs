use std::collections::BTreeSet;

use crate::app::MapReduceApp;
use crate::task::KeyValue;
use crate::wordcount::tokenize;

/// Índice invertido: palabra -> documentos donde aparece.
/// Output por palabra: "<cantidad> <doc1>,<doc2>,..."
pub struct InvertedIndex;

impl MapReduceApp for InvertedIndex {
    fn name(&self) -> &'static str {
        "indexer"
    }

    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue> {
        let words: BTreeSet<String> = tokenize(contents).collect();
        words
            .into_iter()
            .map(|w| KeyValue::new(w, filename))
            .collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        let docs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        let joined = docs.iter().copied().collect::<Vec<_>>().join(",");
        format!("{} {}", docs.len(), joined)
    }
}
