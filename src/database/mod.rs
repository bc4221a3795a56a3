//! # Database Operations
//!
//! PostgreSQL persistence for information packages.
//!
//! ## Key Components
//!
//! - [`connection`] - Pool setup, health check and embedded migrations
//! - [`pg_store`] - [`PackageStore`](crate::state_machine::PackageStore)
//!   implementation with an optimistic version check on save
//!
//! Queries are checked at runtime, so building the crate needs no database.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ingest_core::config::DatabaseConfig;
//! use ingest_core::database::{DatabaseConnection, PgPackageStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::connect(&DatabaseConfig::default()).await?;
//! db.migrate().await?;
//! let store = PgPackageStore::new(db.pool().clone());
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod pg_store;

pub use connection::{DatabaseConnection, MIGRATOR};
pub use pg_store::PgPackageStore;
