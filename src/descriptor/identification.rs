//! Classification of metadata files found in a submission package.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Root elements recognised as known metadata formats
const KNOWN_ROOT_TAGS: [&str; 4] = ["ead", "eac", "premis", "mets"];

/// Bytes read when sniffing the root element
const SNIFF_LIMIT: u64 = 8 * 1024;

/// Where a metadata file is referenced in the archival descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataClass {
    /// XML schema, file group `schemas`
    Schema,
    /// Descriptive metadata section of the given kind (`ead`, `eac`)
    Descriptive(&'static str),
    /// Technical metadata reference
    Technical,
    /// File group `customMD`
    Custom,
    /// Not an XML document; recorded as a preservation object only
    Unclassified,
}

/// Classify a metadata file by name, falling back to its XML root element
pub fn classify_metadata_file(path: &Path) -> io::Result<MetadataClass> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if file_name.ends_with(".xsd") {
        return Ok(MetadataClass::Schema);
    }
    if !file_name.ends_with(".xml") {
        return Ok(MetadataClass::Unclassified);
    }
    if file_name.starts_with("ead") || file_name.ends_with("ead.xml") {
        return Ok(MetadataClass::Descriptive("ead"));
    }
    if file_name.starts_with("eac") || file_name.ends_with("eac.xml") {
        return Ok(MetadataClass::Descriptive("eac"));
    }
    if file_name.starts_with("premis") || file_name.ends_with("premis.xml") {
        return Ok(MetadataClass::Technical);
    }

    let root = root_element(path)?.unwrap_or_default().to_lowercase();
    if KNOWN_ROOT_TAGS.contains(&root.as_str()) {
        Ok(MetadataClass::Technical)
    } else {
        Ok(MetadataClass::Custom)
    }
}

/// Local name of the first element of an XML document
pub fn root_element(path: &Path) -> io::Result<Option<String>> {
    let mut head = Vec::new();
    File::open(path)?.take(SNIFF_LIMIT).read_to_end(&mut head)?;
    Ok(first_element_name(&String::from_utf8_lossy(&head)))
}

fn first_element_name(document: &str) -> Option<String> {
    let mut rest = document;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        // Comments, CDATA, processing instructions and declarations are skipped whole
        let terminator = if rest.starts_with("!--") {
            "-->"
        } else if rest.starts_with("![CDATA[") {
            "]]>"
        } else if rest.starts_with('?') {
            "?>"
        } else if rest.starts_with('!') {
            match (rest.find('['), rest.find('>')) {
                (Some(open), Some(close)) if open < close => "]>",
                _ => ">",
            }
        } else {
            let name: String = rest
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
                .collect();
            let local = name.rsplit(':').next().unwrap_or(&name).to_string();
            return (!local.is_empty()).then_some(local);
        };
        let end = rest.find(terminator)?;
        rest = &rest[end + terminator.len()..];
    }
}
