//! # Models
//!
//! Records persisted by the package store.

pub mod information_package;

pub use information_package::{InformationPackage, NewInformationPackage};
