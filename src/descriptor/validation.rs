use super::checksum::file_checksum;
use super::manifest::{read_json, PackageDescriptor};
use super::schema::DeliverySchema;
use super::DescriptorError;
use crate::constants::layout;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a descriptor validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub log: Vec<String>,
    pub err: Vec<String>,
}

impl ValidationReport {
    pub fn valid(&self) -> bool {
        self.err.is_empty()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.err.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.log.extend(other.log);
        self.err.extend(other.err);
    }
}

/// Descriptor validation collaborator used by the validation stages
pub trait DescriptorValidator: Send + Sync {
    /// Validate a delivery: descriptor structure, archive checksum and declared size
    fn validate_delivery(
        &self,
        delivery_descriptor: &Path,
        schema_file: &Path,
        package_file: &Path,
    ) -> Result<ValidationReport, DescriptorError>;

    /// Re-check the file sizes declared by the descriptor inside an extracted package
    fn validate_file_sizes(&self, package_dir: &Path) -> Result<ValidationReport, DescriptorError>;
}

/// Validator for JSON descriptors
///
/// Schema files are compiled on first use and cached by path.
#[derive(Debug, Default, Clone)]
pub struct ManifestValidator {
    schemas: Arc<DashMap<PathBuf, Arc<DeliverySchema>>>,
}

impl ManifestValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn schema(&self, schema_file: &Path) -> Result<Arc<DeliverySchema>, DescriptorError> {
        if let Some(schema) = self.schemas.get(schema_file) {
            return Ok(schema.value().clone());
        }
        let schema = Arc::new(DeliverySchema::load(schema_file)?);
        self.schemas
            .insert(schema_file.to_path_buf(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Number of compiled schemas held
    pub fn cached_schemas(&self) -> usize {
        self.schemas.len()
    }
}

impl DescriptorValidator for ManifestValidator {
    fn validate_delivery(
        &self,
        delivery_descriptor: &Path,
        schema_file: &Path,
        package_file: &Path,
    ) -> Result<ValidationReport, DescriptorError> {
        let mut report = ValidationReport::default();

        let schema = self.schema(schema_file)?;
        let document: serde_json::Value = read_json(delivery_descriptor)?;
        let violations = schema.violations(&document);
        if !violations.is_empty() {
            report.err.extend(violations);
            return Ok(report);
        }
        report.info(format!(
            "Delivery descriptor is valid against schema: {}",
            delivery_descriptor.display()
        ));

        let descriptor: PackageDescriptor =
            serde_json::from_value(document).map_err(|source| DescriptorError::Json {
                path: delivery_descriptor.to_path_buf(),
                source,
            })?;
        let Some(entry) = descriptor.files.first() else {
            report.error("Delivery descriptor does not reference a package file");
            return Ok(report);
        };

        let actual_size = fs::metadata(package_file)
            .map_err(|source| DescriptorError::Io {
                path: package_file.to_path_buf(),
                source,
            })?
            .len();
        if actual_size == entry.size {
            report.info(format!("File size verified: {} ({actual_size} bytes)", entry.href));
        } else {
            report.error(format!(
                "File size mismatch for {}: declared {}, actual {actual_size}",
                entry.href, entry.size
            ));
        }

        let actual_checksum =
            file_checksum(package_file, entry.checksum_type).map_err(|source| {
                DescriptorError::Io {
                    path: package_file.to_path_buf(),
                    source,
                }
            })?;
        if actual_checksum.eq_ignore_ascii_case(&entry.checksum) {
            report.info(format!(
                "Checksum verified ({}): {}",
                entry.checksum_type, entry.href
            ));
        } else {
            report.error(format!(
                "Checksum mismatch ({}) for {}: declared {}, actual {actual_checksum}",
                entry.checksum_type, entry.href, entry.checksum
            ));
        }

        Ok(report)
    }

    fn validate_file_sizes(&self, package_dir: &Path) -> Result<ValidationReport, DescriptorError> {
        let descriptor: PackageDescriptor =
            read_json(&package_dir.join(layout::DESCRIPTOR_FILE))?;
        let mut report = ValidationReport::default();

        for entry in &descriptor.files {
            let path = entry.resolve(package_dir);
            match fs::metadata(&path) {
                Ok(meta) if meta.len() == entry.size => {}
                Ok(meta) => report.error(format!(
                    "File size mismatch for {}: declared {}, actual {}",
                    entry.href,
                    entry.size,
                    meta.len()
                )),
                Err(_) => report.error(format!("File missing: {}", entry.href)),
            }
        }

        if report.valid() {
            report.info(format!(
                "File sizes of {} files verified",
                descriptor.files.len()
            ));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::checksum::ChecksumAlgorithm;
    use crate::descriptor::manifest::{write_json, FileEntry};
    use serde_json::json;

    fn schema(dir: &Path) -> PathBuf {
        let path = dir.join("schema.json");
        fs::write(&path, DeliverySchema::default_document().to_string()).unwrap();
        path
    }

    fn delivery(dir: &Path, size: u64, checksum: &str) -> PathBuf {
        let descriptor = PackageDescriptor {
            package_type: "DELIVERY".to_string(),
            id: None,
            profile: None,
            files: vec![FileEntry {
                href: "pkg.tar".to_string(),
                size,
                checksum: checksum.to_string(),
                checksum_type: ChecksumAlgorithm::Md5,
                mimetype: None,
            }],
        };
        let path = dir.join("pkg.json");
        write_json(&path, &descriptor).unwrap();
        path
    }

    #[test]
    fn test_valid_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("pkg.tar");
        fs::write(&package, b"abc").unwrap();
        let descriptor = delivery(dir.path(), 3, "900150983cd24fb0d6963f7d28e17f72");

        let validator = ManifestValidator::new();
        let schema = schema(dir.path());

        let report = validator
            .validate_delivery(&descriptor, &schema, &package)
            .unwrap();
        assert!(report.valid(), "{:?}", report.err);
        assert_eq!(report.log.len(), 3);

        validator
            .validate_delivery(&descriptor, &schema, &package)
            .unwrap();
        assert_eq!(validator.cached_schemas(), 1);
    }

    #[test]
    fn test_size_and_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("pkg.tar");
        fs::write(&package, b"abcd").unwrap();
        let descriptor = delivery(dir.path(), 3, "900150983cd24fb0d6963f7d28e17f72");

        let report = ManifestValidator::new()
            .validate_delivery(&descriptor, &schema(dir.path()), &package)
            .unwrap();
        assert_eq!(report.err.len(), 2);
        assert!(report.err[0].starts_with("File size mismatch"));
        assert!(report.err[1].starts_with("Checksum mismatch"));
    }

    #[test]
    fn test_schema_violation_stops_validation() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("pkg.tar");
        fs::write(&package, b"abc").unwrap();
        let descriptor = dir.path().join("pkg.json");
        fs::write(&descriptor, json!({"type": "SIP"}).to_string()).unwrap();

        let report = ManifestValidator::new()
            .validate_delivery(&descriptor, &schema(dir.path()), &package)
            .unwrap();
        assert!(!report.valid());
        assert!(report.err.iter().all(|e| e.starts_with("Property '")), "{:?}", report.err);
        assert!(report.log.is_empty());
    }

    #[test]
    fn test_invalid_schema_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("pkg.tar");
        fs::write(&package, b"abc").unwrap();
        let descriptor = delivery(dir.path(), 3, "900150983cd24fb0d6963f7d28e17f72");
        let schema = dir.path().join("schema.json");
        fs::write(&schema, json!({"type": 12}).to_string()).unwrap();

        let result = ManifestValidator::new().validate_delivery(&descriptor, &schema, &package);
        assert!(matches!(result, Err(DescriptorError::Schema { .. })));
    }

    #[test]
    fn test_file_sizes_of_extracted_package() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Content")).unwrap();
        fs::write(dir.path().join("Content/a.txt"), b"12345").unwrap();
        let descriptor = PackageDescriptor {
            package_type: "SIP".to_string(),
            id: None,
            profile: None,
            files: vec![
                FileEntry {
                    href: "Content/a.txt".to_string(),
                    size: 5,
                    checksum: String::new(),
                    checksum_type: ChecksumAlgorithm::Sha256,
                    mimetype: None,
                },
                FileEntry {
                    href: "Content/b.txt".to_string(),
                    size: 1,
                    checksum: String::new(),
                    checksum_type: ChecksumAlgorithm::Sha256,
                    mimetype: None,
                },
            ],
        };
        write_json(&dir.path().join("METS.json"), &descriptor).unwrap();

        let report = ManifestValidator::new().validate_file_sizes(dir.path()).unwrap();
        assert_eq!(report.err, vec!["File missing: Content/b.txt".to_string()]);
    }
}
