//! # Ingest Configuration Validator
//!
//! Command-line tool for validating ingest configuration files across environments.
//! Helps identify configuration issues before starting an ingest worker.

use clap::{Parser, Subcommand};
use ingest_core::config::{ConfigManager, IngestConfig};
use ingest_core::descriptor::DeliverySchema;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate ingest configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate all configuration sections
    All,

    /// Validate one configuration section
    Component {
        /// Section name (paths, delivery, upload, queue, database)
        name: String,
    },

    /// List available environments
    Environments,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) | None => validate_all_config(&cli),
        Some(Commands::Component { name }) => validate_component(&cli, name),
        Some(Commands::Environments) => list_environments(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<IngestConfig, Box<dyn std::error::Error>> {
    let manager =
        ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    Ok(manager.into_config())
}

fn validate_all_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating ingest configuration");
    println!("Environment: {}", cli.environment);
    if let Some(config_dir) = &cli.config_dir {
        println!("Config Directory: {}", config_dir.display());
    }
    println!();

    let config = match load(cli) {
        Ok(config) => {
            println!("[ok] Configuration loaded and validated");
            config
        }
        Err(e) => {
            println!("[error] Failed to load configuration: {e}");
            return Err(e);
        }
    };

    validate_paths_config(&config)?;
    validate_delivery_config(&config)?;
    validate_upload_config(&config)?;
    validate_queue_config(&config)?;
    validate_database_config(&config)?;

    println!("\nAll configuration validation checks passed");
    Ok(())
}

fn validate_component(cli: &Cli, component_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating component: {component_name}");
    let config = load(cli)?;

    match component_name.to_lowercase().as_str() {
        "paths" => validate_paths_config(&config)?,
        "delivery" => validate_delivery_config(&config)?,
        "upload" => validate_upload_config(&config)?,
        "queue" => validate_queue_config(&config)?,
        "database" => validate_database_config(&config)?,
        _ => return Err(format!("Unknown component: {component_name}").into()),
    }

    println!("[ok] Component '{component_name}' validation passed");
    Ok(())
}

fn list_environments(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let base = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("config"));
    let environments_dir = base.join("ingest").join("environments");
    println!("Available environments in {}:", environments_dir.display());

    if !environments_dir.exists() {
        println!("  (directory not found)");
        return Ok(());
    }

    let mut environments = Vec::new();
    for entry in std::fs::read_dir(&environments_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "yaml") {
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                environments.push(name.to_string());
            }
        }
    }
    environments.sort();
    for env in environments {
        println!("  - {env}");
    }
    Ok(())
}

fn report_dir(label: &str, path: &Path) {
    if path.is_dir() {
        println!("   [ok] {label}: {}", path.display());
    } else {
        println!("   [warn] {label} does not exist: {}", path.display());
    }
}

fn validate_paths_config(config: &IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating paths...");
    report_dir("Work directory", &config.paths.work);
    report_dir("Reception directory", &config.paths.reception);
    report_dir("Storage directory", &config.paths.storage);
    Ok(())
}

fn validate_delivery_config(config: &IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating delivery...");
    let schema = config.schema_path();
    if schema.is_file() {
        DeliverySchema::load(&schema)?;
        println!("   [ok] Schema file compiles: {}", schema.display());
    } else {
        println!("   [warn] Schema file not found: {}", schema.display());
    }
    Ok(())
}

fn validate_upload_config(config: &IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating upload...");
    if !config.upload.resource_path.contains("{0}") {
        return Err("upload.resource_path must contain the {0} file name placeholder".into());
    }
    println!(
        "   [ok] Endpoint: {}/{}",
        config.upload.endpoint.trim_end_matches('/'),
        config.upload.service
    );
    println!(
        "   [ok] Chunk size: {} bytes, timeout: {}s",
        config.upload.chunk_size_bytes, config.upload.timeout_seconds
    );
    Ok(())
}

fn validate_queue_config(config: &IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating queue...");
    println!(
        "   [ok] Workers: {}, capacity: {}",
        config.queue.worker_count, config.queue.capacity
    );
    match config.queue.job_timeout_seconds {
        Some(seconds) => println!("   [ok] Job timeout: {seconds}s"),
        None => println!("   [info] No job timeout configured"),
    }
    match config.queue.finished_job_retention_seconds {
        Some(seconds) => println!("   [ok] Finished jobs retained for {seconds}s"),
        None => println!("   [warn] Finished jobs are kept until forgotten"),
    }
    Ok(())
}

fn validate_database_config(config: &IngestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating database...");
    if config.database.url.is_empty() {
        return Err("Database URL is configured but empty".into());
    }
    if config.database.max_connections == 0 {
        return Err("database.max_connections must be greater than 0".into());
    }
    println!(
        "   [ok] Pool configuration valid (max: {})",
        config.database.max_connections
    );
    Ok(())
}
