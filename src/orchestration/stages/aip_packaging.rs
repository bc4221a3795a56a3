use super::{run_blocking, StageHandler};
use crate::config::IngestConfig;
use crate::constants::PROGRESS_REPORT_INTERVAL;
use crate::models::InformationPackage;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::{StageError, StageResult};
use crate::orchestration::progress::ProgressTracker;
use crate::state_machine::{collect_violations, IdentifierAssignedGuard, Stage};
use crate::storage::{next_archive_path, PackageLayout};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tar::Builder;
use walkdir::WalkDir;

/// Archives the working directory into the storage area as the next
/// generation of `<identifier>_<generation>.tar`
#[derive(Debug, Default)]
pub struct AipPackagingHandler;

#[async_trait::async_trait]
impl StageHandler for AipPackagingHandler {
    fn stage(&self) -> Stage {
        Stage::AipPackaging
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
        let storage = ctx.config.paths.storage.clone();
        let identifier = ctx.record.identifier.clone();
        let working_dir = ctx.layout.working_dir();
        let root_name = ctx.layout.uuid().to_string();
        let progress = ctx.progress.clone();

        run_blocking(ctx, move |logger| {
            fs::create_dir_all(&storage)
                .map_err(|e| StageError::io("creating storage directory", e))?;
            let (generation, target) = next_archive_path(&storage, &identifier)
                .map_err(|e| StageError::io("reading storage directory", e))?;

            let total = count_files(&working_dir)?;
            logger.add_info(format!(
                "Packaging working directory: {}",
                working_dir.display()
            ));
            logger.add_info(format!(
                "Total number of files in working directory: {total}"
            ));
            logger.add_info(format!("Archive generation {generation}: {}", target.display()));

            // The task log is part of the package
            logger.close_sink();

            let partial = target.with_extension("tar.partial");
            if let Err(e) = write_archive(&working_dir, &root_name, &partial, total, &progress) {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
            if let Err(e) = fs::rename(&partial, &target) {
                let _ = fs::remove_file(&partial);
                return Err(StageError::io("storing archive", e));
            }

            logger.add_info(format!("Package stored: {}", target.display()));
            Ok(())
        })
        .await
    }
}

fn count_files(dir: &Path) -> StageResult<usize> {
    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| StageError::io("walking working directory", e.into()))?;
        if entry.file_type().is_file() {
            total += 1;
        }
    }
    Ok(total)
}

/// Write `<root_name>/<relative path>` entries for everything below `dir`
fn write_archive(
    dir: &Path,
    root_name: &str,
    target: &Path,
    total: usize,
    progress: &ProgressTracker,
) -> StageResult<()> {
    let file = File::create(target).map_err(|e| StageError::io("creating archive", e))?;
    let mut builder = Builder::new(BufWriter::new(file));

    let mut packaged = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| StageError::io("walking working directory", e.into()))?;
        let relative = match entry.path().strip_prefix(dir) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => continue,
        };
        let name = Path::new(root_name).join(relative);

        if entry.file_type().is_dir() {
            builder
                .append_dir(&name, entry.path())
                .map_err(|e| StageError::io(format!("archiving {}", name.display()), e))?;
        } else if entry.file_type().is_file() {
            builder
                .append_path_with_name(entry.path(), &name)
                .map_err(|e| StageError::io(format!("archiving {}", name.display()), e))?;
            packaged += 1;
            if packaged % PROGRESS_REPORT_INTERVAL == 0 {
                progress.report_items(packaged, total);
            }
        }
    }

    let mut writer = builder
        .into_inner()
        .map_err(|e| StageError::io("finishing archive", e))?;
    writer
        .flush()
        .map_err(|e| StageError::io("finishing archive", e))?;
    progress.report_items(packaged, total);
    Ok(())
}
