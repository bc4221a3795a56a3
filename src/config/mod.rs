//! # Ingest Configuration
//!
//! YAML-based configuration with per-environment overrides.
//!
//! ## Layout
//!
//! - `config/ingest/base.yaml`: defaults shared by every environment
//! - `config/ingest/environments/<env>.yaml`: optional overrides
//! - `INGEST__<SECTION>__<KEY>` environment variables: final overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ingest_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let work_root = &manager.config().paths.work;
//! let workers = manager.config().queue.worker_count;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring config/ingest/base.yaml
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct IngestConfig {
    pub paths: PathsConfig,
    pub delivery: DeliveryConfig,
    pub upload: UploadConfig,
    pub queue: QueueConfig,
    pub database: DatabaseConfig,
}

/// Filesystem roots
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root of the per-package working directories
    pub work: PathBuf,
    /// Delivery area holding submitted archives and their descriptors
    pub reception: PathBuf,
    /// Archive storage area
    pub storage: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work: PathBuf::from("/var/data/ingest/work"),
            reception: PathBuf::from("/var/data/ingest/reception"),
            storage: PathBuf::from("/var/data/ingest/storage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Descriptor schema file name, resolved against the reception directory
    pub schema_file: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            schema_file: "delivery_schema.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UploadConfig {
    pub endpoint: String,
    pub service: String,
    /// Resource path template; `{0}` is replaced with the archive file name
    pub resource_path: String,
    pub chunk_size_bytes: usize,
    pub timeout_seconds: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            service: "dm-hdfs-storage".to_string(),
            resource_path: "hsink/fileresource/files/{0}".to_string(),
            chunk_size_bytes: 1024 * 1024,
            timeout_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueueConfig {
    pub worker_count: usize,
    pub capacity: usize,
    /// Jobs still running after this long are marked failed
    #[serde(default)]
    pub job_timeout_seconds: Option<u64>,
    /// Finished jobs stay pollable this long; `None` keeps them until forgotten
    #[serde(default = "default_finished_job_retention")]
    pub finished_job_retention_seconds: Option<u64>,
}

fn default_finished_job_retention() -> Option<u64> {
    Some(3600)
}

impl QueueConfig {
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_seconds.map(Duration::from_secs)
    }

    pub fn finished_job_retention(&self) -> Option<Duration> {
        self.finished_job_retention_seconds.map(Duration::from_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            capacity: 100,
            job_timeout_seconds: None,
            finished_job_retention_seconds: default_finished_job_retention(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/ingest_development".to_string(),
            max_connections: 10,
        }
    }
}

impl IngestConfig {
    /// Configuration rooted at `root`, with `work/`, `reception/` and `storage/` below it
    pub fn with_root(root: &Path) -> Self {
        Self {
            paths: PathsConfig {
                work: root.join("work"),
                reception: root.join("reception"),
                storage: root.join("storage"),
            },
            ..Self::default()
        }
    }

    /// Full path of the delivery descriptor schema
    pub fn schema_path(&self) -> PathBuf {
        self.paths.reception.join(&self.delivery.schema_file)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, path) in [
            ("paths.work", &self.paths.work),
            ("paths.reception", &self.paths.reception),
            ("paths.storage", &self.paths.storage),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigurationError::missing_required_field(field, "paths"));
            }
        }

        if self.delivery.schema_file.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "schema_file",
                "delivery",
            ));
        }

        if !(self.upload.endpoint.starts_with("http://")
            || self.upload.endpoint.starts_with("https://"))
        {
            return Err(ConfigurationError::invalid_value(
                "upload.endpoint",
                self.upload.endpoint.clone(),
                "must be an http(s) URL",
            ));
        }

        if self.upload.chunk_size_bytes == 0 {
            return Err(ConfigurationError::invalid_value(
                "upload.chunk_size_bytes",
                "0",
                "must be greater than 0",
            ));
        }

        if self.queue.worker_count == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.worker_count",
                "0",
                "must be greater than 0",
            ));
        }

        if self.queue.capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.capacity",
                "0",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(IngestConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = IngestConfig::default();
        config.upload.endpoint = "ftp://storage".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { .. })
        ));

        let mut config = IngestConfig::default();
        config.queue.worker_count = 0;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.paths.storage = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_rooted_paths() {
        let config = IngestConfig::with_root(Path::new("/tmp/ingest"));
        assert_eq!(config.paths.work, PathBuf::from("/tmp/ingest/work"));
        assert_eq!(
            config.schema_path(),
            PathBuf::from("/tmp/ingest/reception/delivery_schema.json")
        );
    }
}
