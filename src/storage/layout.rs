use crate::constants::layout;
use crate::models::InformationPackage;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem layout of one package's working directory
///
/// ```text
/// <work>/<uuid>/
///   <packagename>/                 extracted SIP
///   metadata/                      task logs, PREMIS.json
///   submission/METS.json           archival descriptor
///   submission/<packagename>/      relocated SIP after AIP creation
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    work_root: PathBuf,
    uuid: String,
    packagename: String,
}

impl PackageLayout {
    pub fn new(
        work_root: impl Into<PathBuf>,
        uuid: impl Into<String>,
        packagename: impl Into<String>,
    ) -> Self {
        Self {
            work_root: work_root.into(),
            uuid: uuid.into(),
            packagename: packagename.into(),
        }
    }

    pub fn for_package(work_root: impl Into<PathBuf>, package: &InformationPackage) -> Self {
        Self::new(work_root, package.uuid.clone(), package.packagename.clone())
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn packagename(&self) -> &str {
        &self.packagename
    }

    pub fn working_dir(&self) -> PathBuf {
        self.work_root.join(&self.uuid)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.working_dir().join(layout::METADATA_DIR)
    }

    /// Task log file `metadata/<name>.log`
    pub fn log_file(&self, name: &str) -> PathBuf {
        self.metadata_dir().join(format!("{name}.log"))
    }

    /// Extracted submission package
    pub fn package_dir(&self) -> PathBuf {
        self.working_dir().join(&self.packagename)
    }

    /// Descriptor shipped inside the submission package
    pub fn package_descriptor(&self) -> PathBuf {
        self.package_dir().join(layout::DESCRIPTOR_FILE)
    }

    pub fn submission_dir(&self) -> PathBuf {
        self.working_dir().join(layout::SUBMISSION_DIR)
    }

    /// Submission package after relocation into `submission/`
    pub fn submission_package_dir(&self) -> PathBuf {
        self.submission_dir().join(&self.packagename)
    }

    /// Archival descriptor written during AIP creation
    pub fn archival_descriptor(&self) -> PathBuf {
        self.submission_dir().join(layout::DESCRIPTOR_FILE)
    }

    pub fn preservation_record(&self) -> PathBuf {
        self.metadata_dir().join(layout::PRESERVATION_FILE)
    }

    /// Create the working directory and its metadata folder
    pub fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(self.metadata_dir())
    }

    /// Path relative to the working directory, `/`-separated
    pub fn relative_to_working_dir(&self, path: &Path) -> Option<String> {
        let working_dir = self.working_dir();
        let relative = path.strip_prefix(&working_dir).ok()?;
        Some(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }
}

/// Child directory of `parent` whose name equals `name` ignoring ASCII case
pub fn find_dir_case_insensitive(parent: &Path, name: &str) -> io::Result<Option<PathBuf>> {
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        if entry.file_type()?.is_dir()
            && entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
        {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}
