use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use common::{engine, MapReduceApp, MapTaskSpec, ReduceTaskSpec, TaskIndex};
use tracing::info;

/// Ejecuta un map: lee el input, aplica `map`, ordena por clave y reparte en
/// archivos intermedios dentro de `work_dir`.
///
/// Devuelve partición -> archivo intermedio.
pub fn run_map(
    app: &dyn MapReduceApp,
    task: &MapTaskSpec,
    work_dir: &Path,
) -> Result<BTreeMap<TaskIndex, String>> {
    let bytes = fs::read(&task.file_path)
        .with_context(|| format!("no se pudo leer el input {}", task.file_path))?;
    let contents = String::from_utf8_lossy(&bytes);

    let mut records = app.map(&task.file_path, &contents);
    engine::sort_by_key(&mut records);

    let files = engine::write_intermediate(work_dir, task.index, task.reduce_count, &records)
        .with_context(|| format!("no se pudieron escribir los intermedios del map {}", task.index))?;

    info!(
        "map {} listo: {} registros en {} particiones",
        task.index,
        records.len(),
        files.len()
    );
    Ok(files)
}

/// Ejecuta un reduce: junta todos los intermedios, agrupa por clave, aplica
/// `reduce` y publica el output con rename atómico.
///
/// Devuelve la ruta final del output.
pub fn run_reduce(app: &dyn MapReduceApp, task: &ReduceTaskSpec, work_dir: &Path) -> Result<PathBuf> {
    let mut records = Vec::new();
    for path in &task.intermediate_files {
        let recs = engine::read_intermediate(path)
            .with_context(|| format!("no se pudo leer el intermedio {}", path))?;
        records.extend(recs);
    }

    let total = records.len();
    let lines = engine::group_and_reduce(records, |key, values| app.reduce(key, values));

    let out = engine::output_path(work_dir, task.index);
    engine::commit_output(&out, &lines)
        .with_context(|| format!("no se pudo publicar {}", out.display()))?;

    info!(
        "reduce {} listo: {} registros, {} claves -> {}",
        task.index,
        total,
        lines.len(),
        out.display()
    );
    Ok(out)
}
