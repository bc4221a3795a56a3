use super::StageHandler;
use crate::config::IngestConfig;
use crate::models::InformationPackage;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::{StageError, StageResult};
use crate::state_machine::{collect_violations, IdentifierAssignedGuard, Stage};
use crate::storage::{latest_archive, PackageLayout};
use crate::upload::ProgressFn;
use std::sync::Arc;
use std::time::Instant;

/// Transfers the latest archive generation of a package to remote storage
#[derive(Debug, Default)]
pub struct RemoteUploadHandler;

#[async_trait::async_trait]
impl StageHandler for RemoteUploadHandler {
    fn stage(&self) -> Stage {
        Stage::RemoteUpload
    }

    fn needs_working_directory(&self) -> bool {
        false
    }

    fn log_file_name(&self) -> Option<&'static str> {
        None
    }

    fn check_preconditions(
        &self,
        record: &InformationPackage,
        _layout: &PackageLayout,
        _config: &IngestConfig,
    ) -> Vec<String> {
        collect_violations(record, &[&IdentifierAssignedGuard])
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        let identifier = ctx.record.identifier.clone();
        let Some(archive) = latest_archive(&ctx.config.paths.storage, &identifier)
            .map_err(|e| StageError::io("reading storage directory", e))?
        else {
            ctx.logger
                .add_error(format!("No AIP file found for identifier: {identifier}"));
            return Ok(());
        };
        ctx.logger
            .add_info(format!("Uploading {}", archive.display()));

        let tracker = ctx.progress.clone();
        let progress: ProgressFn = Arc::new(move |percent| tracker.report(percent));

        let started = Instant::now();
        match ctx
            .services
            .uploader
            .upload(&archive, &ctx.config.upload.resource_path, progress)
            .await
        {
            Ok(result) => {
                crate::log_upload!(info, "Upload finished",
                    package_id: ctx.record.id,
                    status_code: result.status_code,
                    remote_id: result.remote_id.clone()
                );
                ctx.logger.add_info(format!(
                    "Upload finished in {} seconds with status code {}: {}",
                    started.elapsed().as_secs(),
                    result.status_code,
                    result.remote_id
                ));
            }
            Err(e) => {
                crate::log_upload!(warn, "Upload failed",
                    package_id: ctx.record.id,
                    status_code: e.status_code(),
                    error: e.to_string()
                );
                match e.status_code() {
                    Some(code) => ctx
                        .logger
                        .add_error(format!("Upload failed with status code {code}: {e}")),
                    None => ctx.logger.add_error(format!("Upload failed: {e}")),
                }
            }
        }
        Ok(())
    }
}
