//! Generation-numbered archive naming in the storage area.
//!
//! Every packaging run of a package produces `<identifier>_<generation>.tar`,
//! never replacing an earlier generation.

use crate::constants::layout;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Generation encoded in `file_name` for `identifier`, if the name matches
fn generation_of(file_name: &str, identifier: &str) -> Option<u32> {
    file_name
        .strip_prefix(identifier)?
        .strip_prefix('_')?
        .strip_suffix(layout::ARCHIVE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Existing generations for `identifier`, unsorted
fn generations(storage_dir: &Path, identifier: &str) -> io::Result<Vec<(u32, PathBuf)>> {
    if !storage_dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(storage_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(generation) = generation_of(&name.to_string_lossy(), identifier) {
            found.push((generation, entry.path()));
        }
    }
    Ok(found)
}

/// Path for the next archive generation (0 when none exists)
///
/// Fails once the highest generation is `u32::MAX`.
pub fn next_archive_path(storage_dir: &Path, identifier: &str) -> io::Result<(u32, PathBuf)> {
    let latest = generations(storage_dir, identifier)?
        .into_iter()
        .map(|(generation, _)| generation)
        .max();
    let next = match latest {
        None => 0,
        Some(generation) => generation.checked_add(1).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Archive generations exhausted for {identifier}"),
            )
        })?,
    };
    Ok((next, archive_path(storage_dir, identifier, next)))
}

/// Highest existing generation for `identifier`
pub fn latest_archive(storage_dir: &Path, identifier: &str) -> io::Result<Option<PathBuf>> {
    Ok(generations(storage_dir, identifier)?
        .into_iter()
        .max_by_key(|(generation, _)| *generation)
        .map(|(_, path)| path))
}

pub fn archive_path(storage_dir: &Path, identifier: &str, generation: u32) -> PathBuf {
    storage_dir.join(format!(
        "{identifier}_{generation}.{}",
        layout::ARCHIVE_EXTENSION
    ))
}

/// Open a submitted package (`.tar`, `.tar.gz` or `.tgz`) for reading
pub fn open_package_archive(path: &Path) -> io::Result<Archive<Box<dyn Read + Send>>> {
    let archive_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file = File::open(path)?;
    let reader: Box<dyn Read + Send> = if archive_name.ends_with(".tar.gz") || archive_name.ends_with(".tgz") {
        Box::new(GzDecoder::new(file))
    } else if archive_name.ends_with(".tar") {
        Box::new(file)
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Unsupported archive format: {archive_name}"),
        ));
    };
    Ok(Archive::new(reader))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_parsing() {
        assert_eq!(generation_of("abc_0.tar", "abc"), Some(0));
        assert_eq!(generation_of("abc_12.tar", "abc"), Some(12));
        assert_eq!(generation_of("abc_x.tar", "abc"), None);
        assert_eq!(generation_of("abcd_1.tar", "abc"), None);
        assert_eq!(generation_of("abc_1.zip", "abc"), None);
    }

    #[test]
    fn test_next_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path();

        let (generation, first) = next_archive_path(storage, "id1").unwrap();
        assert_eq!(generation, 0);
        assert_eq!(first, storage.join("id1_0.tar"));
        assert_eq!(latest_archive(storage, "id1").unwrap(), None);

        fs::write(&first, b"").unwrap();
        fs::write(storage.join("id1_3.tar"), b"").unwrap();
        fs::write(storage.join("other_9.tar"), b"").unwrap();

        let (generation, next) = next_archive_path(storage, "id1").unwrap();
        assert_eq!(generation, 4);
        assert_eq!(next, storage.join("id1_4.tar"));
        assert_eq!(
            latest_archive(storage, "id1").unwrap(),
            Some(storage.join("id1_3.tar"))
        );
    }

    #[test]
    fn test_generation_overflow_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path();
        fs::write(storage.join(format!("id2_{}.tar", u32::MAX)), b"").unwrap();

        let error = next_archive_path(storage, "id2").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
        assert!(error.to_string().contains("id2"));
        assert_eq!(
            latest_archive(storage, "id2").unwrap(),
            Some(storage.join(format!("id2_{}.tar", u32::MAX)))
        );
    }

    #[test]
    fn test_open_package_archive() {
        let dir = tempfile::tempdir().unwrap();
        let tar_path = dir.path().join("pkg.tar");
        let mut builder = tar::Builder::new(File::create(&tar_path).unwrap());
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_cksum();
        builder.append_data(&mut header, "pkg/a.txt", &b"hi"[..]).unwrap();
        builder.finish().unwrap();
        drop(builder);

        let mut archive = open_package_archive(&tar_path).unwrap();
        assert_eq!(archive.entries().unwrap().count(), 1);

        let zip_path = dir.path().join("pkg.zip");
        fs::write(&zip_path, b"").unwrap();
        assert!(open_package_archive(&zip_path).is_err());
    }

    #[test]
    fn test_missing_storage_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(next_archive_path(&missing, "x").unwrap().0, 0);
        assert_eq!(latest_archive(&missing, "x").unwrap(), None);
    }
}
