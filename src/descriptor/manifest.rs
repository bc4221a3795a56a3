//! # Descriptor Documents
//!
//! JSON equivalents of the METS and PREMIS documents exchanged by the pipeline:
//!
//! - [`PackageDescriptor`]: delivery descriptor next to a submitted archive and
//!   `METS.json` inside a submission package
//! - [`ArchivalDescriptor`]: `submission/METS.json` written during AIP creation
//! - [`PreservationRecord`]: `metadata/PREMIS.json`

use super::checksum::ChecksumAlgorithm;
use super::DescriptorError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const FILE_URL_PREFIX: &str = "file://";

/// One file referenced by a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub href: String,
    pub size: u64,
    pub checksum: String,
    pub checksum_type: ChecksumAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl FileEntry {
    /// Resolve `href` (plain relative path or `file://./...`) against `base`
    pub fn resolve(&self, base: &Path) -> PathBuf {
        let relative = self
            .href
            .strip_prefix(FILE_URL_PREFIX)
            .unwrap_or(&self.href);
        let relative = relative.strip_prefix("./").unwrap_or(relative);
        base.join(relative)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Named file group of an archival descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
    pub name: String,
    pub files: Vec<FileEntry>,
}

/// Reference to a metadata document (`dmdSec`, `techMD`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivalDescriptor {
    #[serde(rename = "type")]
    pub package_type: String,
    pub id: String,
    pub created: DateTime<Utc>,
    pub file_groups: Vec<FileGroup>,
    pub dmd_sections: Vec<MetadataReference>,
    pub tech_md: Vec<MetadataReference>,
    pub digiprov_md: Vec<MetadataReference>,
    pub rights_md: Vec<MetadataReference>,
}

impl ArchivalDescriptor {
    pub fn new(id: impl Into<String>, group_names: &[&str]) -> Self {
        Self {
            package_type: "AIP".to_string(),
            id: id.into(),
            created: Utc::now(),
            file_groups: group_names
                .iter()
                .map(|name| FileGroup {
                    name: (*name).to_string(),
                    files: Vec::new(),
                })
                .collect(),
            dmd_sections: Vec::new(),
            tech_md: Vec::new(),
            digiprov_md: Vec::new(),
            rights_md: Vec::new(),
        }
    }

    /// Add a file to a group, creating the group if needed
    pub fn add_file(&mut self, group: &str, entry: FileEntry) {
        match self.file_groups.iter_mut().find(|g| g.name == group) {
            Some(existing) => existing.files.push(entry),
            None => self.file_groups.push(FileGroup {
                name: group.to_string(),
                files: vec![entry],
            }),
        }
    }

    pub fn group(&self, name: &str) -> Option<&FileGroup> {
        self.file_groups.iter().find(|g| g.name == name)
    }

    pub fn add_dmd_section(&mut self, kind: &str, href: impl Into<String>) -> String {
        let id = format!("dmd{:03}", self.dmd_sections.len() + 1);
        self.dmd_sections.push(MetadataReference {
            id: id.clone(),
            kind: Some(kind.to_string()),
            href: href.into(),
        });
        id
    }

    pub fn add_tech_md(&mut self, href: impl Into<String>) -> String {
        let id = format!("tech{:03}", self.tech_md.len() + 1);
        self.tech_md.push(MetadataReference {
            id: id.clone(),
            kind: None,
            href: href.into(),
        });
        id
    }

    pub fn add_digiprov_md(&mut self, href: impl Into<String>) -> String {
        let id = format!("digiprov{:03}", self.digiprov_md.len() + 1);
        self.digiprov_md.push(MetadataReference {
            id: id.clone(),
            kind: None,
            href: href.into(),
        });
        id
    }

    pub fn add_rights_md(&mut self, href: impl Into<String>) -> String {
        let id = format!("rights{:03}", self.rights_md.len() + 1);
        self.rights_md.push(MetadataReference {
            id: id.clone(),
            kind: None,
            href: href.into(),
        });
        id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservationAgent {
    pub name: String,
    pub agent_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservationEvent {
    pub event_type: String,
    pub outcome: String,
    pub agent: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreservationRecord {
    pub objects: Vec<String>,
    pub agents: Vec<PreservationAgent>,
    pub events: Vec<PreservationEvent>,
}

impl PreservationRecord {
    pub fn add_object(&mut self, href: impl Into<String>) {
        self.objects.push(href.into());
    }

    pub fn add_agent(&mut self, name: &str) {
        self.agents.push(PreservationAgent {
            name: name.to_string(),
            agent_type: "software".to_string(),
        });
    }

    pub fn add_event(&mut self, event_type: &str, outcome: &str, agent: &str) {
        self.events.push(PreservationEvent {
            event_type: event_type.to_string(),
            outcome: outcome.to_string(),
            agent: agent.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Read and deserialize a JSON descriptor
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DescriptorError> {
    let raw = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DescriptorError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a descriptor as pretty JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DescriptorError> {
    let raw = serde_json::to_string_pretty(value).map_err(|source| DescriptorError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, raw).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })
}
