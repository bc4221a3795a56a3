use super::progress::ProgressTracker;
use super::task_logger::TaskLogger;
use crate::config::IngestConfig;
use crate::descriptor::{DescriptorValidator, ManifestValidator};
use crate::identifier::{IdentifierGenerator, UuidIdentifierGenerator};
use crate::models::InformationPackage;
use crate::storage::PackageLayout;
use crate::upload::{PackageUploader, RemoteUploadClient, UploadError};
use std::sync::Arc;
use uuid::Uuid;

/// External collaborators available to stage handlers
#[derive(Clone)]
pub struct StageServices {
    pub validator: Arc<dyn DescriptorValidator>,
    pub identifiers: Arc<dyn IdentifierGenerator>,
    pub uploader: Arc<dyn PackageUploader>,
}

impl StageServices {
    pub fn new(
        validator: Arc<dyn DescriptorValidator>,
        identifiers: Arc<dyn IdentifierGenerator>,
        uploader: Arc<dyn PackageUploader>,
    ) -> Self {
        Self {
            validator,
            identifiers,
            uploader,
        }
    }

    /// Default collaborators built from configuration
    pub fn from_config(config: &IngestConfig) -> Result<Self, UploadError> {
        Ok(Self::new(
            Arc::new(ManifestValidator::new()),
            Arc::new(UuidIdentifierGenerator),
            Arc::new(RemoteUploadClient::from_config(&config.upload)?),
        ))
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn PackageUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn DescriptorValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_identifiers(mut self, identifiers: Arc<dyn IdentifierGenerator>) -> Self {
        self.identifiers = identifiers;
        self
    }
}

impl std::fmt::Debug for StageServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageServices").finish_non_exhaustive()
    }
}

/// Everything a stage handler works with during one execution
///
/// `record` is a private copy; the executor commits it after the handler returns.
#[derive(Debug)]
pub struct StageContext {
    pub task_id: Uuid,
    pub record: InformationPackage,
    pub layout: PackageLayout,
    pub logger: TaskLogger,
    pub progress: ProgressTracker,
    pub config: Arc<IngestConfig>,
    pub services: StageServices,
}

impl StageContext {
    /// Refresh the layout after the handler changed naming fields of the record
    pub fn refresh_layout(&mut self) {
        self.layout = PackageLayout::for_package(&self.config.paths.work, &self.record);
    }
}
