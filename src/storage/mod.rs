//! # Package Storage
//!
//! Working-directory layout of a package and naming of stored archives.

pub mod archive;
pub mod layout;

pub use archive::{archive_path, latest_archive, next_archive_path, open_package_archive};
pub use layout::{find_dir_case_insensitive, PackageLayout};
