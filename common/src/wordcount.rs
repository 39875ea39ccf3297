use crate::app::MapReduceApp;
use crate::task::KeyValue;

/// Normaliza un token: sólo alfanumérico y '_', en minúscula.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|raw| {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_lowercase();

        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    })
}

/// WordCount clásico: emite (palabra, "1") y el reduce cuenta.
pub struct WordCount;

impl MapReduceApp for WordCount {
    fn name(&self) -> &'static str {
        "wc"
    }

    fn map(&self, _filename: &str, contents: &str) -> Vec<KeyValue> {
        tokenize(contents).map(|w| KeyValue::new(w, "1")).collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.len().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_normalizes_case_and_punctuation() {
        let tokens: Vec<String> = tokenize("Hola hola, mundo!!\nmundo   mundo_prueba --").collect();
        assert_eq!(tokens, vec!["hola", "hola", "mundo", "mundo", "mundo_prueba"]);
    }

    #[test]
    fn map_emits_one_pair_per_word() {
        let kvs = WordCount.map("in.txt", "the quick the");
        assert_eq!(
            kvs,
            vec![
                KeyValue::new("the", "1"),
                KeyValue::new("quick", "1"),
                KeyValue::new("the", "1"),
            ]
        );
    }

    #[test]
    fn map_on_empty_input_emits_nothing() {
        assert!(WordCount.map("empty.txt", "").is_empty());
    }

    #[test]
    fn reduce_counts_values() {
        let values = vec!["1".to_string(); 3];
        assert_eq!(WordCount.reduce("the", &values), "3");
    }
}
