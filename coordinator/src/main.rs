use std::{collections::HashSet, fs, net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use common::config;
use coordinator::{failover, handlers, Coordinator};
use glob::glob;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Cada cuánto el driver consulta `done()`.
const DONE_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Margen antes de cerrar para que los últimos reportes lleguen.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "Coordinador de un job map-reduce")]
struct Args {
    /// Archivos o patrones glob de entrada, ej: "data/pg-*.txt".
    /// Sin entradas el job sólo corre reduces vacíos.
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,

    /// Cantidad de tareas reduce (particiones)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    n_reduce: u32,

    /// Directorio donde los workers dejan los outputs
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Dirección de escucha; por defecto 127.0.0.1:<puerto del usuario>
    #[arg(long, env = "COORDINATOR_ADDR")]
    addr: Option<SocketAddr>,
}

/// Expande los patrones a una lista de archivos, sin repetidos y en el
/// orden en que aparecen.
fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let entries = glob(pattern).with_context(|| format!("patrón inválido: {}", pattern))?;
        let mut matched = 0;
        for path in entries.flatten() {
            if !path.is_file() {
                continue;
            }
            matched += 1;
            let path = path.to_string_lossy().to_string();
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
        if matched == 0 {
            warn!("el patrón {} no encontró archivos", pattern);
        }
    }

    Ok(files)
}

async fn wait_until_done(state: &Coordinator) {
    loop {
        tokio::time::sleep(DONE_POLL_INTERVAL).await;
        if state.done() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=debug,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let files = expand_inputs(&args.inputs)?;
    fs::create_dir_all(&args.work_dir)
        .with_context(|| format!("no se pudo crear {}", args.work_dir.display()))?;

    let state = Coordinator::new(
        files,
        args.n_reduce as usize,
        config::lease_timeout(),
        args.work_dir.clone(),
    );

    // failover de leases en segundo plano
    let sweeper = tokio::spawn(failover::run_lease_sweeper(
        state.clone(),
        config::sweep_interval(),
    ));

    let addr = args
        .addr
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], config::default_port())));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", addr))?;
    info!("coordinador escuchando en {}", listener.local_addr()?);

    let app = handlers::build_router(state.clone());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::select! {
        _ = wait_until_done(&state) => {
            let p = state.progress();
            info!(
                "job terminado: {} maps, {} reduces, {} reasignaciones, outputs en {}",
                p.maps_completed,
                p.reduces_completed,
                p.reassignments,
                args.work_dir.display()
            );
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrumpido antes de terminar el job");
        }
    }

    tokio::time::sleep(SHUTDOWN_GRACE).await;
    sweeper.abort();
    server.abort();
    Ok(())
}
