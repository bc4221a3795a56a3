//! # Stage Handlers
//!
//! One handler per pipeline [`Stage`]. A handler only does the stage's work on
//! its [`StageContext`]; the executor owns preconditions on the status code,
//! working directory preparation, status resolution and the commit.
//!
//! Handlers report trouble two ways:
//! - an `Err(StageError)` for faults that abort the stage
//! - `ctx.logger.add_error(..)` for failures that let the stage finish its
//!   reporting before the error status is recorded

use super::context::StageContext;
use super::errors::StageResult;
use super::task_logger::TaskLogger;
use crate::config::IngestConfig;
use crate::constants::layout;
use crate::models::InformationPackage;
use crate::state_machine::Stage;
use crate::storage::PackageLayout;

pub mod aip_creation;
pub mod aip_packaging;
pub mod aip_validation;
pub mod delivery_validation;
pub mod identifier_assignment;
pub mod remote_upload;
pub mod reset;
pub mod sip_extraction;
pub mod sip_validation;

pub use aip_creation::AipCreationHandler;
pub use aip_packaging::AipPackagingHandler;
pub use aip_validation::AipValidationHandler;
pub use delivery_validation::DeliveryValidationHandler;
pub use identifier_assignment::IdentifierAssignmentHandler;
pub use remote_upload::RemoteUploadHandler;
pub use reset::ResetHandler;
pub use sip_extraction::SipExtractionHandler;
pub use sip_validation::SipValidationHandler;

/// Work performed by one pipeline stage
#[async_trait::async_trait]
pub trait StageHandler: Send + Sync {
    /// Stage this handler implements
    fn stage(&self) -> Stage;

    /// Whether the stage works inside `<work>/<uuid>`
    ///
    /// When true the executor assigns a uuid if the record has none and
    /// creates the working directory before `run`.
    fn needs_working_directory(&self) -> bool {
        true
    }

    /// Task log file under `metadata/`, `None` keeps the log in memory
    fn log_file_name(&self) -> Option<&'static str> {
        Some(layout::PROCESSING_LOG)
    }

    /// Stage-specific precondition violations beyond the status predicate
    ///
    /// Violations leave the record untouched.
    fn check_preconditions(
        &self,
        record: &InformationPackage,
        layout: &PackageLayout,
        config: &IngestConfig,
    ) -> Vec<String> {
        let _ = (record, layout, config);
        Vec::new()
    }

    /// Input files the stage reads, reported as missing-path lines
    ///
    /// Checked once the status predicate holds; a missing input fails the
    /// stage and records its error status.
    fn check_inputs(
        &self,
        record: &InformationPackage,
        layout: &PackageLayout,
        config: &IngestConfig,
    ) -> Vec<String> {
        let _ = (record, layout, config);
        Vec::new()
    }

    /// Perform the stage's work
    async fn run(&self, ctx: &mut StageContext) -> StageResult<()>;
}

/// Run blocking filesystem work on the blocking thread pool
///
/// The task logger is lent to `work` and put back into `ctx` once it returns.
/// If `work` panics the lines it logged are lost; the panic surfaces as
/// [`StageError::Panicked`](super::errors::StageError::Panicked).
pub async fn run_blocking<T, F>(ctx: &mut StageContext, work: F) -> StageResult<T>
where
    F: FnOnce(&mut TaskLogger) -> StageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let mut logger = std::mem::replace(&mut ctx.logger, TaskLogger::in_memory());
    let (logger, result) = tokio::task::spawn_blocking(move || {
        let result = work(&mut logger);
        (logger, result)
    })
    .await?;
    ctx.logger = logger;
    result
}
