use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{config, JobProgress, JobResults};
use reqwest::Client;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar al coordinador")]
struct Cli {
    /// URL del coordinador; por defecto http://127.0.0.1:<puerto del usuario>
    #[arg(long, global = true, env = config::COORDINATOR_URL_ENV)]
    coordinator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estado y avance del job
    Status,
    /// Lista los archivos de salida ya publicados
    Results,
}

fn print_progress(job: &JobProgress) {
    println!("Job:");
    println!("  estado: {:?}", job.status);
    println!("  terminado: {}", job.done);
    println!(
        "  maps: {}/{} completados",
        job.maps_completed, job.map_total
    );
    println!(
        "  reduces: {}/{} completados",
        job.reduces_completed, job.reduce_total
    );
    println!("  en curso: {}", job.tasks_in_progress);
    println!(
        "  leases vencidos: {}, reportes descartados: {}",
        job.reassignments, job.stale_reports
    );

    // progreso calculado localmente
    let total = job.map_total + job.reduce_total;
    if total > 0 {
        let pct = ((job.maps_completed + job.reduces_completed) as f64 / total as f64) * 100.0;
        println!("  progreso: {:.1}%", pct);
    } else {
        println!("  progreso: (sin tareas)");
    }

    println!("  iniciado: {}", job.started_at);
    if let Some(ref done) = job.finished_at {
        println!("  finalizado: {}", done);
    }
}

fn print_results(results: &JobResults) {
    println!("Resultados:");
    println!("  directorio de salida: {}", results.output_dir);
    if results.files.is_empty() {
        println!("  (sin archivos de salida)");
    } else {
        println!("  archivos:");
        for f in &results.files {
            println!("    - {}", f);
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli
        .coordinator
        .unwrap_or_else(config::coordinator_base_url);

    match cli.command {
        Commands::Status => {
            let url = format!("{}/api/v1/job", base_url);
            let job: JobProgress = client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("no se pudo contactar al coordinador en {}", base_url))?
                .error_for_status()?
                .json()
                .await?;
            print_progress(&job);
        }

        Commands::Results => {
            let url = format!("{}/api/v1/job/results", base_url);
            let results: JobResults = client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("no se pudo contactar al coordinador en {}", base_url))?
                .error_for_status()?
                .json()
                .await?;
            print_results(&results);
        }
    }

    Ok(())
}
