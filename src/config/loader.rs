//! Configuration Loader
//!
//! Environment-aware configuration loading. Merges the base YAML file, the
//! environment override file and `INGEST__` environment variables.

use super::error::{ConfigResult, ConfigurationError};
use super::IngestConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const BASE_FILE: &str = "ingest/base.yaml";
const ENVIRONMENTS_DIR: &str = "ingest/environments";
const ENV_PREFIX: &str = "INGEST";
const ENV_SEPARATOR: &str = "__";

/// Loaded configuration plus the environment it was resolved for
#[derive(Debug)]
pub struct ConfigManager {
    config: IngestConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        crate::log_config!(info, "Configuration loaded successfully",
            environment: environment,
            work_dir: config.paths.work.display().to_string(),
            storage_dir: config.paths.storage.display().to_string(),
            worker_count: config.queue.worker_count
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Environment the configuration was resolved for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Consume the manager and return the configuration
    pub fn into_config(self: Arc<Self>) -> IngestConfig {
        Arc::try_unwrap(self)
            .map(|manager| manager.config)
            .unwrap_or_else(|shared| shared.config.clone())
    }

    /// Detect environment from `INGEST_ENV`, then `APP_ENV`
    pub fn detect_environment() -> String {
        env::var("INGEST_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<IngestConfig> {
        let base_path = config_directory.join(BASE_FILE);
        if !base_path.is_file() {
            return Err(ConfigurationError::config_file_not_found(vec![base_path]));
        }

        let override_path = config_directory
            .join(ENVIRONMENTS_DIR)
            .join(format!("{environment}.yaml"));
        if override_path.is_file() {
            debug!("Applying environment overrides from {}", override_path.display());
        }

        let merged = Config::builder()
            .add_source(File::from(base_path.clone()))
            .add_source(File::from(override_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(base_path.display().to_string(), e))?;

        Ok(merged.try_deserialize::<IngestConfig>()?)
    }
}
