use super::{run_blocking, StageHandler};
use crate::config::IngestConfig;
use crate::constants::PROGRESS_REPORT_INTERVAL;
use crate::models::InformationPackage;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::{StageError, StageResult};
use crate::orchestration::progress::ProgressTracker;
use crate::orchestration::task_logger::TaskLogger;
use crate::state_machine::{collect_violations, PathExistsGuard, Stage};
use crate::storage::{open_package_archive, PackageLayout};
use std::path::Path;

/// Unpacks the submitted archive into the working directory
#[derive(Debug, Default)]
pub struct SipExtractionHandler;

#[async_trait::async_trait]
impl StageHandler for SipExtractionHandler {
    fn stage(&self) -> Stage {
        Stage::SipExtraction
    }

    fn check_inputs(
        &self,
        record: &InformationPackage,
        _layout: &PackageLayout,
        _config: &IngestConfig,
    ) -> Vec<String> {
        let package = PathExistsGuard::new("Package file", record.package_file());
        collect_violations(record, &[&package])
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        let package_file = ctx.record.package_file().to_path_buf();
        let working_dir = ctx.layout.working_dir();
        ctx.logger.add_info(format!(
            "Extracting {} to {}",
            package_file.display(),
            working_dir.display()
        ));

        let progress = ctx.progress.clone();
        let total = run_blocking(ctx, move |logger| {
            let total = count_entries(&package_file)?;
            extract(&package_file, &working_dir, total, logger, &progress)?;
            Ok(total)
        })
        .await?;

        ctx.logger
            .add_info(format!("Extraction of {total} items finished"));
        Ok(())
    }
}

fn count_entries(package_file: &Path) -> StageResult<usize> {
    let mut archive =
        open_package_archive(package_file).map_err(|e| StageError::io("opening package", e))?;
    let entries = archive
        .entries()
        .map_err(|e| StageError::Archive(e.to_string()))?;
    let mut total = 0;
    for entry in entries {
        entry.map_err(|e| StageError::Archive(e.to_string()))?;
        total += 1;
    }
    Ok(total)
}

fn extract(
    package_file: &Path,
    working_dir: &Path,
    total: usize,
    logger: &mut TaskLogger,
    progress: &ProgressTracker,
) -> StageResult<()> {
    let mut archive =
        open_package_archive(package_file).map_err(|e| StageError::io("opening package", e))?;
    let entries = archive
        .entries()
        .map_err(|e| StageError::Archive(e.to_string()))?;

    let mut extracted = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| StageError::Archive(e.to_string()))?;
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .map_err(|e| StageError::Archive(e.to_string()))?;

        // `unpack_in` refuses entries escaping the working directory
        if !entry
            .unpack_in(working_dir)
            .map_err(|e| StageError::io(format!("extracting {name}"), e))?
        {
            logger.add_error(format!("Skipped entry outside working directory: {name}"));
            continue;
        }
        logger.add_quiet_info(format!("File extracted: {name}"));

        extracted += 1;
        if extracted % PROGRESS_REPORT_INTERVAL == 0 {
            progress.report_items(extracted, total);
        }
    }
    progress.report_items(extracted, total);
    Ok(())
}
