//! Shared fixtures for the ingest integration tests.
//!
//! Every fixture owns a temporary root with `reception/`, `work/` and
//! `storage/` below it, an in-memory package store and a delivery schema.

#![allow(dead_code)]

pub mod strategies;

use ingest_core::config::IngestConfig;
use ingest_core::descriptor::{
    file_checksum, write_json, ChecksumAlgorithm, DeliverySchema, FileEntry, PackageDescriptor,
};
use ingest_core::models::{InformationPackage, NewInformationPackage};
use ingest_core::orchestration::{
    ProgressTracker, StageServices, TaskExecutor, TaskRequest, TaskResult,
};
use ingest_core::state_machine::{InMemoryPackageStore, PackageStore, Stage};
use ingest_core::upload::{PackageUploader, ProgressFn, UploadError, UploadResult};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const DELIVERY_TYPE: &str = "DELIVERY";

pub struct IngestFixture {
    pub root: TempDir,
    pub config: Arc<IngestConfig>,
    pub store: Arc<InMemoryPackageStore>,
}

impl IngestFixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp root");
        let config = IngestConfig::with_root(root.path());
        for dir in [
            &config.paths.reception,
            &config.paths.work,
            &config.paths.storage,
        ] {
            fs::create_dir_all(dir).expect("Failed to create fixture directory");
        }

        write_json(&config.schema_path(), &DeliverySchema::default_document())
            .expect("Failed to write schema");

        Self {
            root,
            config: Arc::new(config),
            store: Arc::new(InMemoryPackageStore::new()),
        }
    }

    pub fn services(&self) -> StageServices {
        StageServices::from_config(&self.config).expect("Failed to build stage services")
    }

    pub fn executor(&self) -> Arc<TaskExecutor> {
        self.executor_with(self.services())
    }

    pub fn executor_with(&self, services: StageServices) -> Arc<TaskExecutor> {
        let store: Arc<dyn PackageStore> = self.store.clone();
        Arc::new(
            TaskExecutor::new(store, Arc::clone(&self.config), services)
                .expect("Failed to build executor"),
        )
    }

    pub fn reception(&self) -> &Path {
        &self.config.paths.reception
    }

    pub fn storage(&self) -> &Path {
        &self.config.paths.storage
    }

    pub fn working_dir(&self, record: &InformationPackage) -> PathBuf {
        self.config.paths.work.join(&record.uuid)
    }

    /// Register a package at `status`, optionally with an identifier already assigned
    pub async fn seed(
        &self,
        path: &Path,
        status: i32,
        identifier: Option<&str>,
    ) -> InformationPackage {
        let record = self
            .store
            .insert(NewInformationPackage::new(path.display().to_string()).with_status(status))
            .await
            .expect("Failed to insert package");
        let Some(identifier) = identifier else {
            return record;
        };
        let mut updated = record;
        updated.identifier = identifier.to_string();
        self.store.save(&updated).await.expect("Failed to save package")
    }

    pub async fn record(&self, package_id: i64) -> InformationPackage {
        self.store
            .get(package_id)
            .await
            .expect("Store lookup failed")
            .expect("Package missing from store")
    }

    pub async fn run(
        &self,
        executor: &TaskExecutor,
        stage: Stage,
        package_id: i64,
    ) -> TaskResult {
        executor
            .execute(&TaskRequest::new(stage, package_id), ProgressTracker::silent())
            .await
            .expect("Task execution returned an infrastructure error")
    }

    /// Write a submission package with `content_files` content files and a
    /// matching delivery descriptor into the reception area
    pub fn write_sip(&self, name: &str, content_files: usize) -> PathBuf {
        let archive = self.reception().join(format!("{name}.tar"));
        let mut builder = tar::Builder::new(File::create(&archive).expect("create archive"));

        let mut entries = Vec::new();
        for index in 0..content_files {
            let href = format!("Content/file_{index:03}.txt");
            let body = format!("content of file {index}\n").repeat(index + 1);
            append_file(&mut builder, &format!("{name}/{href}"), body.as_bytes());
            entries.push(file_entry(&href, body.as_bytes()));
        }

        let ead = b"<ead><archdesc level=\"fonds\"/></ead>\n";
        append_file(&mut builder, &format!("{name}/Metadata/ead.xml"), ead);
        entries.push(file_entry("Metadata/ead.xml", ead));

        let descriptor = PackageDescriptor {
            package_type: "SIP".to_string(),
            id: Some(name.to_string()),
            profile: None,
            files: entries,
        };
        let descriptor_bytes = serde_json::to_vec_pretty(&descriptor).expect("serialize METS");
        append_file(&mut builder, &format!("{name}/METS.json"), &descriptor_bytes);
        builder.finish().expect("finish archive");
        drop(builder);

        self.write_delivery_descriptor(&archive, ChecksumAlgorithm::Md5);
        archive
    }

    /// Write an archive holding exactly `files` flat entries plus its delivery descriptor
    pub fn write_flat_archive(&self, name: &str, files: usize) -> PathBuf {
        let archive = self.reception().join(format!("{name}.tar"));
        let mut builder = tar::Builder::new(File::create(&archive).expect("create archive"));
        for index in 0..files {
            append_file(
                &mut builder,
                &format!("{name}/Content/item_{index:03}.txt"),
                format!("item {index}\n").as_bytes(),
            );
        }
        builder.finish().expect("finish archive");
        drop(builder);

        self.write_delivery_descriptor(&archive, ChecksumAlgorithm::Sha256);
        archive
    }

    /// Delivery descriptor `<archive stem>.json` declaring the archive's size and checksum
    pub fn write_delivery_descriptor(&self, archive: &Path, algorithm: ChecksumAlgorithm) -> PathBuf {
        let size = fs::metadata(archive).expect("archive metadata").len();
        let checksum = file_checksum(archive, algorithm).expect("archive checksum");
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let descriptor = PackageDescriptor {
            package_type: DELIVERY_TYPE.to_string(),
            id: None,
            profile: None,
            files: vec![FileEntry {
                href: file_name,
                size,
                checksum,
                checksum_type: algorithm,
                mimetype: Some("application/x-tar".to_string()),
            }],
        };
        let path = archive.with_extension("json");
        write_json(&path, &descriptor).expect("write delivery descriptor");
        path
    }
}

fn append_file<W: std::io::Write>(builder: &mut tar::Builder<W>, path: &str, body: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, path, body)
        .expect("append archive entry");
}

fn file_entry(href: &str, body: &[u8]) -> FileEntry {
    use sha2::{Digest, Sha256};
    FileEntry {
        href: href.to_string(),
        size: body.len() as u64,
        checksum: hex::encode(Sha256::digest(body)),
        checksum_type: ChecksumAlgorithm::Sha256,
        mimetype: None,
    }
}

/// Progress values collected from a tracker
pub fn recording_tracker() -> (ProgressTracker, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (ProgressTracker::new(move |p| sink.lock().push(p)), seen)
}

/// Uploader answering with a fixed outcome and recording the uploaded paths
pub struct MockUploader {
    pub uploaded: Mutex<Vec<PathBuf>>,
    reject_with: Option<u16>,
}

impl MockUploader {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            uploaded: Mutex::new(Vec::new()),
            reject_with: None,
        })
    }

    pub fn rejecting(status_code: u16) -> Arc<Self> {
        Arc::new(Self {
            uploaded: Mutex::new(Vec::new()),
            reject_with: Some(status_code),
        })
    }
}

#[async_trait::async_trait]
impl PackageUploader for MockUploader {
    async fn upload(
        &self,
        local_path: &Path,
        _resource_path_template: &str,
        progress: ProgressFn,
    ) -> Result<UploadResult, UploadError> {
        self.uploaded.lock().push(local_path.to_path_buf());
        progress(50);
        if let Some(status_code) = self.reject_with {
            return Err(UploadError::Rejected {
                status_code,
                body: "storage unavailable".to_string(),
            });
        }
        progress(100);
        Ok(UploadResult {
            status_code: 201,
            remote_id: "remote-0001".to_string(),
        })
    }
}
