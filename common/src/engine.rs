use const_fnv1a_hash::fnv1a_hash_str_32;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

use crate::task::{KeyValue, TaskIndex};

/* =========================
   Particionado
   ========================= */

/// FNV-1a de 32 bits de la clave, con el bit alto en cero. Tiene que dar lo
/// mismo en todos los procesos: de él depende qué reduce recibe cada clave.
pub fn ihash(key: &str) -> u32 {
    fnv1a_hash_str_32(key) & 0x7fff_ffff
}

/// Partición (tarea reduce) a la que va una clave.
pub fn partition_for(key: &str, n_reduce: usize) -> TaskIndex {
    ihash(key) as usize % n_reduce.max(1)
}

/* =========================
   Nombres de archivos
   ========================= */

pub fn intermediate_file_name(map_index: TaskIndex, partition: TaskIndex) -> String {
    format!("mr-{}-{}", map_index, partition)
}

pub fn output_file_name(reduce_index: TaskIndex) -> String {
    format!("mr-out-{}", reduce_index)
}

/// Orden estable por clave; los empates conservan el orden de llegada.
pub fn sort_by_key(records: &mut [KeyValue]) {
    records.sort_by(|a, b| a.key.cmp(&b.key));
}

/* =========================
   Escritura atómica
   ========================= */

/// Escribe en un temporal del mismo directorio y al final lo renombra sobre
/// `final_path`. Quien lea `final_path` ve el archivo viejo o el completo,
/// nunca uno a medias.
fn write_atomically<F>(final_path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<NamedTempFile>) -> io::Result<()>,
{
    let dir = match final_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut writer = BufWriter::new(NamedTempFile::new_in(dir)?);
    write(&mut writer)?;

    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(final_path).map_err(|e| e.error)?;
    Ok(())
}

/* =========================
   Archivos intermedios (map -> reduce)
   ========================= */

/// Reparte los registros de un map en archivos por partición dentro de `dir`.
///
/// Formato: un `KeyValue` JSON por línea (JSONL). Cada archivo se crea
/// entero en cada intento, así que re-ejecutar el mismo map reemplaza la
/// salida anterior en vez de sumarle registros.
///
/// Devuelve partición -> ruta, sólo para las particiones que recibieron algo.
pub fn write_intermediate(
    dir: &Path,
    map_index: TaskIndex,
    n_reduce: usize,
    records: &[KeyValue],
) -> io::Result<BTreeMap<TaskIndex, String>> {
    let mut buckets: BTreeMap<TaskIndex, Vec<&KeyValue>> = BTreeMap::new();
    for kv in records {
        buckets
            .entry(partition_for(&kv.key, n_reduce))
            .or_default()
            .push(kv);
    }

    let mut out = BTreeMap::new();
    for (partition, recs) in buckets {
        let path = dir.join(intermediate_file_name(map_index, partition));
        write_atomically(&path, |w| {
            for kv in recs {
                serde_json::to_writer(&mut *w, kv)?;
                w.write_all(b"\n")?;
            }
            Ok(())
        })?;
        out.insert(partition, path.to_string_lossy().to_string());
    }

    Ok(out)
}

/// Lee un archivo intermedio completo.
///
/// Si un registro no decodifica (archivo truncado, basura al final) se deja
/// de leer ese archivo y se devuelve lo leído hasta ahí. Errores de E/S
/// (archivo inexistente, disco) sí se propagan.
pub fn read_intermediate(path: &str) -> io::Result<Vec<KeyValue>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for item in serde_json::Deserializer::from_reader(reader).into_iter::<KeyValue>() {
        match item {
            Ok(kv) => out.push(kv),
            Err(e) if e.is_io() => return Err(e.into()),
            Err(_) => break,
        }
    }

    Ok(out)
}

/* =========================
   Reduce
   ========================= */

/// Ordena por clave, agrupa claves consecutivas iguales y aplica `reduce`
/// a cada grupo. Devuelve (clave, valor reducido) en orden de clave.
pub fn group_and_reduce<F>(mut records: Vec<KeyValue>, mut reduce: F) -> Vec<(String, String)>
where
    F: FnMut(&str, &[String]) -> String,
{
    sort_by_key(&mut records);

    let mut out = Vec::new();
    let mut i = 0;
    while i < records.len() {
        let mut j = i + 1;
        while j < records.len() && records[j].key == records[i].key {
            j += 1;
        }

        let values: Vec<String> = records[i..j].iter().map(|kv| kv.value.clone()).collect();
        let reduced = reduce(&records[i].key, &values);
        out.push((records[i].key.clone(), reduced));

        i = j;
    }

    out
}

/// Escribe "clave valor" por línea y publica el archivo con rename atómico.
pub fn commit_output(final_path: &Path, lines: &[(String, String)]) -> io::Result<()> {
    write_atomically(final_path, |w| {
        for (key, value) in lines {
            writeln!(w, "{} {}", key, value)?;
        }
        Ok(())
    })
}

/// Ruta final del output de un reduce dentro de `dir`.
pub fn output_path(dir: &Path, reduce_index: TaskIndex) -> PathBuf {
    dir.join(output_file_name(reduce_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, io::Write, path::PathBuf};

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("mr_engine_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    fn kv(k: &str, v: &str) -> KeyValue {
        KeyValue::new(k, v)
    }

    /* =========================
       HASH / PARTICIONES
       ========================= */

    #[test]
    fn ihash_is_32_bit_fnv1a_without_sign_bit() {
        let keys = ["", "the", "quick", "brown", "fox"];
        let hashes: Vec<u32> = keys.iter().map(|k| ihash(k)).collect();
        assert_eq!(hashes, vec![18652613, 873378332, 2000274364, 817772335, 921932622]);
    }

    #[test]
    fn partition_is_ihash_mod_n_reduce() {
        // 873378332 % 10 = 2, 817772335 % 10 = 5
        assert_eq!(partition_for("the", 10), 2);
        assert_eq!(partition_for("brown", 10), 5);
    }

    #[test]
    fn partition_for_stays_in_range() {
        let n = 10;
        for key in ["a", "b", "c", "xyz", "otro", ""] {
            let p = partition_for(key, n);
            assert!(p < n);
            assert_eq!(p, partition_for(key, n));
        }
    }

    #[test]
    fn file_names_are_deterministic() {
        assert_eq!(intermediate_file_name(3, 7), "mr-3-7");
        assert_eq!(output_file_name(2), "mr-out-2");
    }

    #[test]
    fn sort_by_key_is_stable_on_ties() {
        let mut recs = vec![kv("b", "1"), kv("a", "x"), kv("b", "2"), kv("a", "y")];
        sort_by_key(&mut recs);
        assert_eq!(recs, vec![kv("a", "x"), kv("a", "y"), kv("b", "1"), kv("b", "2")]);
    }

    /* =========================
       INTERMEDIOS
       ========================= */

    #[test]
    fn write_then_read_intermediate_keeps_records() {
        let tmp = temp_dir("roundtrip");
        let input = vec![kv("a", "1"), kv("b", "1"), kv("a", "1"), kv("c d", "x\ny")];

        let files = write_intermediate(&tmp, 4, 3, &input).unwrap();

        let mut seen = Vec::new();
        for (partition, path) in &files {
            assert!(path.ends_with(&intermediate_file_name(4, *partition)));
            let recs = read_intermediate(path).unwrap();
            for r in &recs {
                assert_eq!(partition_for(&r.key, 3), *partition);
            }
            seen.extend(recs);
        }

        let mut expected = input.clone();
        sort_by_key(&mut expected);
        sort_by_key(&mut seen);
        assert_eq!(seen, expected);
    }

    #[test]
    fn write_intermediate_only_reports_touched_partitions() {
        let tmp = temp_dir("touched");
        let files = write_intermediate(&tmp, 0, 2, &[kv("the", "1")]).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files.contains_key(&partition_for("the", 2)));
    }

    #[test]
    fn rerunning_a_map_replaces_previous_output() {
        let tmp = temp_dir("rerun");
        let input = vec![kv("a", "1"), kv("a", "1")];

        write_intermediate(&tmp, 0, 1, &input).unwrap();
        let files = write_intermediate(&tmp, 0, 1, &input).unwrap();

        let recs = read_intermediate(&files[&0]).unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn read_intermediate_stops_at_garbage() {
        let tmp = temp_dir("garbage");
        let path = tmp.join("mr-0-0");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{}", r#"{"key":"a","value":"1"}"#).unwrap();
        writeln!(f, "{}", r#"{"key":"b","value":"2"}"#).unwrap();
        write!(f, "{}", r#"{"key":"c","val"#).unwrap();

        let recs = read_intermediate(path.to_str().unwrap()).unwrap();
        assert_eq!(recs, vec![kv("a", "1"), kv("b", "2")]);
    }

    #[test]
    fn read_intermediate_fails_when_file_missing() {
        let tmp = temp_dir("missing");
        let path = tmp.join("no_existe");
        assert!(read_intermediate(path.to_str().unwrap()).is_err());
    }

    /* =========================
       REDUCE
       ========================= */

    #[test]
    fn group_and_reduce_groups_consecutive_keys_in_order() {
        let recs = vec![kv("b", "1"), kv("a", "1"), kv("b", "1"), kv("c", "1"), kv("b", "1")];

        let out = group_and_reduce(recs, |_, values| values.len().to_string());

        assert_eq!(
            out,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "3".to_string()),
                ("c".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn group_and_reduce_on_empty_input_is_empty() {
        let out = group_and_reduce(Vec::new(), |_, _| unreachable!());
        assert!(out.is_empty());
    }

    #[test]
    fn commit_output_writes_lines_and_leaves_no_temp_files() {
        let tmp = temp_dir("commit");
        let final_path = output_path(&tmp, 1);

        let lines = vec![
            ("brown".to_string(), "1".to_string()),
            ("fox".to_string(), "2".to_string()),
        ];
        commit_output(&final_path, &lines).unwrap();

        let content = fs::read_to_string(&final_path).unwrap();
        assert_eq!(content, "brown 1\nfox 2\n");

        let entries: Vec<_> = fs::read_dir(&tmp).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn commit_output_with_no_lines_creates_empty_file() {
        let tmp = temp_dir("commit_empty");
        let final_path = output_path(&tmp, 0);

        commit_output(&final_path, &[]).unwrap();

        assert!(final_path.exists());
        assert!(fs::read_to_string(final_path).unwrap().is_empty());
    }
}
