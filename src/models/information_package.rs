//! # Information Package Model
//!
//! Persistent state of one package moving through the ingest pipeline.
//!
//! ## Database Schema
//!
//! Maps to the `information_packages` table:
//! - `id`: Primary key (BIGINT)
//! - `uuid`: Working directory identifier, empty until first assigned
//! - `identifier`: Public persistent identifier, empty until assigned
//! - `packagename`: Base name of the submitted archive
//! - `path`: Path of the submitted archive
//! - `statusprocess`: Pipeline status code
//! - `version`: Optimistic concurrency token, bumped on every save

use crate::constants::{layout, status_codes};
use crate::state_machine::states::PackageState;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InformationPackage {
    pub id: i64,
    pub uuid: String,
    pub identifier: String,
    pub packagename: String,
    pub path: String,
    pub statusprocess: i32,
    pub version: i64,
}

/// New package to be registered with a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInformationPackage {
    pub path: String,
    pub statusprocess: i32,
}

impl NewInformationPackage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            statusprocess: status_codes::NEW,
        }
    }

    pub fn with_status(mut self, statusprocess: i32) -> Self {
        self.statusprocess = statusprocess;
        self
    }
}

impl InformationPackage {
    /// Registered state for the current status code, `None` for unknown codes
    pub fn state(&self) -> Option<PackageState> {
        PackageState::from_code(self.statusprocess)
    }

    pub fn has_uuid(&self) -> bool {
        !self.uuid.is_empty()
    }

    pub fn has_identifier(&self) -> bool {
        !self.identifier.is_empty()
    }

    /// Submitted archive path
    pub fn package_file(&self) -> &Path {
        Path::new(&self.path)
    }

    /// Package name derived from the submitted archive (file name minus last extension)
    pub fn derived_packagename(&self) -> String {
        self.package_file()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Delivery descriptor expected next to the submitted archive
    pub fn delivery_descriptor(&self) -> PathBuf {
        self.package_file()
            .with_extension(layout::DELIVERY_DESCRIPTOR_EXTENSION)
    }

    /// Directory the submitted archive was delivered into
    pub fn delivery_dir(&self) -> PathBuf {
        self.package_file()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// True when only the concurrency token differs
    pub fn same_content(&self, other: &InformationPackage) -> bool {
        self.id == other.id
            && self.uuid == other.uuid
            && self.identifier == other.identifier
            && self.packagename == other.packagename
            && self.path == other.path
            && self.statusprocess == other.statusprocess
    }
}
