//! # Ingest Worker
//!
//! Command-line entry point: registers packages, runs pipeline stages through
//! the job queue and prints the status registry.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ingest_core::config::ConfigManager;
use ingest_core::database::{DatabaseConnection, PgPackageStore};
use ingest_core::execution::{JobQueue, JobState};
use ingest_core::logging::init_structured_logging;
use ingest_core::models::NewInformationPackage;
use ingest_core::orchestration::{StageServices, TaskExecutor, TaskRequest};
use ingest_core::state_machine::{PackageState, PackageStore, Stage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "ingest-worker")]
#[command(about = "Run ingest pipeline stages against information packages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration directory (default: config)
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,

    /// Register a submitted package
    Register {
        /// Path of the submitted archive
        #[arg(long)]
        path: PathBuf,
    },

    /// Run one stage against one package and wait for the result
    Run {
        #[arg(long)]
        package_id: i64,

        /// Stage name, e.g. delivery_validation or SIPExtraction
        #[arg(long)]
        stage: Stage,
    },

    /// Print the status registry
    Statuses,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_structured_logging();

    match cli.command {
        Commands::Statuses => {
            print_statuses();
            Ok(())
        }
        command => run(command, cli.config_dir).await,
    }
}

async fn run(command: Commands, config_dir: Option<PathBuf>) -> Result<()> {
    let manager = ConfigManager::load_from_directory(config_dir)
        .context("loading configuration")?;
    let config = Arc::new(manager.config().clone());

    let db = DatabaseConnection::connect(&config.database)
        .await
        .context("connecting to database")?;
    let store = Arc::new(PgPackageStore::new(db.pool().clone()));

    match command {
        Commands::Migrate => {
            db.migrate().await.context("applying migrations")?;
            println!("Migrations applied");
        }
        Commands::Register { path } => {
            let record = store
                .insert(NewInformationPackage::new(path.display().to_string()))
                .await
                .context("registering package")?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Run { package_id, stage } => {
            let services =
                StageServices::from_config(&config).context("building upload client")?;
            let executor = Arc::new(TaskExecutor::new(store, Arc::clone(&config), services)?);
            let queue = JobQueue::start(executor, &config.queue);

            let job_id = queue
                .submit(TaskRequest::new(stage, package_id))
                .await
                .context("submitting job")?;
            info!(job_id = %job_id, stage = %stage, package_id, "Job submitted");

            let mut last_percent = None;
            loop {
                let status = queue
                    .poll(job_id)
                    .context("job disappeared from the queue")?;
                if status.state.is_terminal() {
                    break;
                }
                if status.state == JobState::Progress && last_percent != Some(status.percent) {
                    eprintln!("{stage}: {}%", status.percent);
                    last_percent = Some(status.percent);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }

            println!("{}", serde_json::to_string_pretty(&queue.poll_response(job_id))?);
            queue.shutdown().await;
        }
        Commands::Statuses => print_statuses(),
    }

    db.close().await;
    Ok(())
}

fn print_statuses() {
    for state in PackageState::all() {
        println!("{:>6}  {:<40} {:?}", state.code(), state.label(), state.workflow());
    }
    println!();
    for stage in Stage::ALL {
        let (success, error) = stage.stage_codes();
        println!(
            "{:<22} expects {:<28} success {:>4}  error {:>4}",
            stage.display_name(),
            stage.expected_status().to_string(),
            success,
            error
        );
    }
}
