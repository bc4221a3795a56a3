//! # Structured Logging Module
//!
//! Environment-aware structured logging to the console and, when the `log/`
//! directory is writable, to a JSON file per process.
//!
//! Per-task logs shown to operators are kept separately by
//! [`TaskLogger`](crate::orchestration::task_logger::TaskLogger).

use chrono::Utc;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_path = PathBuf::from("log").join(format!("{environment}.{pid}.{timestamp}.log"));

        let file_layer = open_log_file(&log_path).map(|file| {
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(env_filter(&log_level))
        });
        let file_enabled = file_layer.is_some();

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(env_filter(&log_level)),
            )
            .with(file_layer);

        // A subscriber may already be installed by an embedding process
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = ?file_enabled.then(|| log_path.display().to_string()),
            "Structured logging initialized"
        );
    });
}

fn open_log_file(path: &PathBuf) -> Option<File> {
    let dir = path.parent()?;
    fs::create_dir_all(dir).ok()?;
    File::create(path).ok()
}

/// `RUST_LOG` wins over the environment default
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("INGEST_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log task execution operations
#[macro_export]
macro_rules! log_task {
    // Full form with task id and stage
    ($level:ident, $operation:expr, task_id: $task_id:expr, stage: $stage:expr $(, $key:ident: $value:expr)* $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            task_id = %$task_id,
            stage = %$stage,
            $($key = ?$value,)*
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "{}", $operation
        );
    };
    // Simple form - just operation
    ($level:ident, $operation:expr $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "{}", $operation
        );
    };
    // Generic form with additional fields
    ($level:ident, $operation:expr, $($key:ident: $value:expr),+ $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            $($key = ?$value,)*
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "{}", $operation
        );
    };
}

/// Log package record operations
#[macro_export]
macro_rules! log_package {
    ($level:ident, $operation:expr, package_id: $package_id:expr $(, $key:ident: $value:expr)* $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            package_id = $package_id,
            $($key = ?$value,)*
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "PACKAGE {}", $operation
        );
    };
}

/// Log remote upload operations
#[macro_export]
macro_rules! log_upload {
    ($level:ident, $operation:expr, $($key:ident: $value:expr),* $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            $($key = ?$value,)*
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "UPLOAD {}", $operation
        );
    };
}

/// Log configuration operations
#[macro_export]
macro_rules! log_config {
    // Simple form - just operation
    ($level:ident, $operation:expr $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "{}", $operation
        );
    };
    // Generic form with additional fields
    ($level:ident, $operation:expr, $($key:ident: $value:expr),+ $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            $($key = ?$value,)*
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "{}", $operation
        );
    };
}
