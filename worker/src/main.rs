use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use common::{app_by_name, config, APP_NAMES};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use worker::{CoordinatorClient, Worker, WorkerConfig};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Worker map-reduce: pide tareas al coordinador hasta que lo apaguen")]
struct Args {
    /// App a ejecutar (wc, indexer)
    #[arg(long, default_value = "wc")]
    app: String,

    /// Directorio para intermedios y outputs
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// URL del coordinador; por defecto http://127.0.0.1:<puerto del usuario>
    #[arg(long, env = config::COORDINATOR_URL_ENV)]
    coordinator: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let args = Args::parse();

    let app = app_by_name(&args.app).with_context(|| {
        format!(
            "app desconocida '{}' (disponibles: {})",
            args.app,
            APP_NAMES.join(", ")
        )
    })?;

    fs::create_dir_all(&args.work_dir)
        .with_context(|| format!("no se pudo crear {}", args.work_dir.display()))?;

    let base_url = args
        .coordinator
        .unwrap_or_else(config::coordinator_base_url);
    let client = CoordinatorClient::new(
        base_url.clone(),
        config::worker_rpc_retries(),
        config::rpc_retry_backoff(),
    )?;

    // Nombre de host (solo para info)
    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    info!(
        "worker en {} (app={}, work_dir={}) contra {}",
        hostname,
        app.name(),
        args.work_dir.display(),
        base_url
    );

    let worker = Worker::new(
        client,
        app,
        WorkerConfig {
            work_dir: args.work_dir,
            backoff: config::worker_backoff(),
        },
    );

    if let Err(e) = worker.run().await {
        error!("worker termina: {:#}", e);
        return Err(e);
    }
    Ok(())
}
