//! AIP creation
//!
//! Moves the extracted package to `submission/<packagename>` and writes the
//! archival descriptor (`submission/METS.json`) and preservation record
//! (`metadata/PREMIS.json`). The descriptor lists every content and metadata
//! file plus the submitted package's own `METS.json`. All hrefs are relative
//! to the working directory, which becomes the root of the stored archive.

use super::{run_blocking, StageHandler};
use crate::config::IngestConfig;
use crate::constants::{layout, AIP_CREATION_AGENT, PROGRESS_REPORT_INTERVAL};
use crate::descriptor::{
    classify_metadata_file, file_checksum, write_json, ArchivalDescriptor, ChecksumAlgorithm,
    FileEntry, MetadataClass, PreservationRecord,
};
use crate::models::InformationPackage;
use crate::orchestration::context::StageContext;
use crate::orchestration::errors::{StageError, StageResult};
use crate::orchestration::progress::ProgressTracker;
use crate::orchestration::task_logger::TaskLogger;
use crate::state_machine::{collect_violations, PathExistsGuard, Stage};
use crate::storage::{find_dir_case_insensitive, PackageLayout};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SUBMISSION_GROUP: &str = "submission";
const SCHEMAS_GROUP: &str = "schemas";
const CUSTOM_MD_GROUP: &str = "customMD";

#[derive(Debug, Default)]
pub struct AipCreationHandler;

#[async_trait::async_trait]
impl StageHandler for AipCreationHandler {
    fn stage(&self) -> Stage {
        Stage::AipCreation
    }

    fn check_inputs(
        &self,
        record: &InformationPackage,
        layout: &PackageLayout,
        _config: &IngestConfig,
    ) -> Vec<String> {
        let package_dir = PathExistsGuard::new("Package directory", layout.package_dir());
        collect_violations(record, &[&package_dir])
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        let layout = ctx.layout.clone();
        let progress = ctx.progress.clone();
        run_blocking(ctx, move |logger| create_aip(&layout, logger, &progress)).await
    }
}

fn create_aip(
    layout: &PackageLayout,
    logger: &mut TaskLogger,
    progress: &ProgressTracker,
) -> StageResult<()> {
    let source = layout.package_dir();
    let target = layout.submission_package_dir();
    fs::create_dir_all(layout.submission_dir())
        .map_err(|e| StageError::io("creating submission directory", e))?;
    fs::rename(&source, &target)
        .map_err(|e| StageError::io("moving package into submission directory", e))?;
    logger.add_info(format!(
        "Package moved to submission directory: {}",
        target.display()
    ));
    progress.report(5);

    let content_files = match find_dir_case_insensitive(&target, layout::CONTENT_DIR)
        .map_err(|e| StageError::io("reading package directory", e))?
    {
        Some(dir) => list_files(&dir)?,
        None => {
            logger.add_info("No content directory found in package");
            Vec::new()
        }
    };
    let metadata_files = match find_dir_case_insensitive(&target, layout::PACKAGE_METADATA_DIR)
        .map_err(|e| StageError::io("reading package directory", e))?
    {
        Some(dir) => list_files(&dir)?,
        None => {
            logger.add_info("No metadata directory found in package");
            Vec::new()
        }
    };
    let package_descriptor = target.join(layout::DESCRIPTOR_FILE);
    let package_descriptor = package_descriptor.is_file().then_some(package_descriptor);
    let total = content_files.len() + metadata_files.len();

    let mut descriptor = ArchivalDescriptor::new(
        layout.uuid(),
        &[SUBMISSION_GROUP, SCHEMAS_GROUP, CUSTOM_MD_GROUP],
    );
    let mut premis = PreservationRecord::default();
    let premis_href = href(layout, &layout.preservation_record())?;
    descriptor.add_tech_md(premis_href.clone());
    descriptor.add_digiprov_md(premis_href.clone());
    descriptor.add_rights_md(premis_href);

    let mut done = 0;
    for path in &content_files {
        let entry = file_entry(layout, path)?;
        premis.add_object(entry.href.clone());
        descriptor.add_file(SUBMISSION_GROUP, entry);
        done += 1;
        if done % PROGRESS_REPORT_INTERVAL == 0 {
            progress.report_items(done, total);
        }
    }

    for path in &metadata_files {
        let entry = file_entry(layout, path)?;
        let class = classify_metadata_file(path)
            .map_err(|e| StageError::io(format!("reading {}", path.display()), e))?;
        premis.add_object(entry.href.clone());
        match class {
            MetadataClass::Schema => descriptor.add_file(SCHEMAS_GROUP, entry),
            MetadataClass::Descriptive(kind) => {
                descriptor.add_dmd_section(kind, entry.href.clone());
                descriptor.add_file(SUBMISSION_GROUP, entry);
            }
            MetadataClass::Technical => {
                descriptor.add_tech_md(entry.href.clone());
                descriptor.add_file(SUBMISSION_GROUP, entry);
            }
            MetadataClass::Custom => descriptor.add_file(CUSTOM_MD_GROUP, entry),
            MetadataClass::Unclassified => descriptor.add_file(SUBMISSION_GROUP, entry),
        }
        done += 1;
        if done % PROGRESS_REPORT_INTERVAL == 0 {
            progress.report_items(done, total);
        }
    }

    // The submitted package's own descriptor is part of the submission
    if let Some(path) = &package_descriptor {
        let entry = file_entry(layout, path)?;
        premis.add_object(entry.href.clone());
        descriptor.add_file(SUBMISSION_GROUP, entry);
    }
    logger.add_info(format!(
        "{} content files and {} metadata files recorded",
        content_files.len(),
        metadata_files.len()
    ));

    premis.add_agent(AIP_CREATION_AGENT);
    premis.add_event("AIPCreation", "success", AIP_CREATION_AGENT);

    write_json(&layout.archival_descriptor(), &descriptor)?;
    logger.add_info(format!(
        "Archival descriptor written: {}",
        layout.archival_descriptor().display()
    ));
    write_json(&layout.preservation_record(), &premis)?;
    logger.add_info(format!(
        "Preservation record written: {}",
        layout.preservation_record().display()
    ));
    progress.report(95);
    Ok(())
}

/// Regular files below `dir`, in file name order
fn list_files(dir: &Path) -> StageResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| StageError::io("walking package directory", e.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn href(layout: &PackageLayout, path: &Path) -> StageResult<String> {
    layout.relative_to_working_dir(path).ok_or_else(|| {
        StageError::failed(format!(
            "Path outside working directory: {}",
            path.display()
        ))
    })
}

fn file_entry(layout: &PackageLayout, path: &Path) -> StageResult<FileEntry> {
    let size = fs::metadata(path)
        .map_err(|e| StageError::io(format!("reading {}", path.display()), e))?
        .len();
    let checksum = file_checksum(path, ChecksumAlgorithm::Sha256)
        .map_err(|e| StageError::io(format!("computing checksum of {}", path.display()), e))?;
    Ok(FileEntry {
        href: href(layout, path)?,
        size,
        checksum,
        checksum_type: ChecksumAlgorithm::Sha256,
        mimetype: None,
    })
}
