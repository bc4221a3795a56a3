#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Ingest Core
//!
//! Status-tracked ingest pipeline that turns a submission information package
//! (SIP) into an archival information package (AIP) and ships it to remote
//! storage.
//!
//! ## Overview
//!
//! Every information package carries a numeric status. Each pipeline stage is
//! an explicit task invocation that checks the status precondition of the
//! stage, does its work, and commits either the stage's success code or its
//! error code. There is no automatic progression between stages and no
//! partial success within one stage.
//!
//! ```text
//! NEW(0) → DeliveryValidation(100) → IdentifierAssignment(200) → SIPExtraction(300)
//!        → SIPValidation(400) → AIPCreation(500) → AIPValidation(600)
//!        → AIPPackaging(700) → RemoteUpload(800)
//! ```
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Status registry, stages, predicates, guards and the package store
//! - [`orchestration`] - Task executor, stage handlers, task logger and progress
//! - [`execution`] - Job queue with worker pool and polling responses
//! - [`descriptor`] - Descriptor documents, fixity and validation
//! - [`storage`] - Working directory layout and archive naming
//! - [`upload`] - Streaming remote upload client
//! - [`database`] - PostgreSQL package store and migrations
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and macros
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ingest_core::config::IngestConfig;
//! use ingest_core::execution::JobQueue;
//! use ingest_core::models::NewInformationPackage;
//! use ingest_core::orchestration::{StageServices, TaskExecutor, TaskRequest};
//! use ingest_core::state_machine::{InMemoryPackageStore, PackageStore, Stage};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(IngestConfig::default());
//! let store = Arc::new(InMemoryPackageStore::new());
//! let record = store
//!     .insert(NewInformationPackage::new("/var/data/ingest/reception/SIP-1.tar"))
//!     .await?;
//!
//! let services = StageServices::from_config(&config)?;
//! let executor = Arc::new(TaskExecutor::new(store, config.clone(), services)?);
//! let queue = JobQueue::start(executor, &config.queue);
//!
//! let job = queue.submit(TaskRequest::new(Stage::DeliveryValidation, record.id)).await?;
//! println!("{:?}", queue.poll_response(job));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod descriptor;
pub mod error;
pub mod execution;
pub mod identifier;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod storage;
pub mod upload;

pub use config::{ConfigManager, IngestConfig};
pub use constants::status_codes;
pub use error::{IngestError, Result};
pub use execution::{JobId, JobQueue, JobState, PollResponse};
pub use models::{InformationPackage, NewInformationPackage};
pub use orchestration::{ProgressTracker, StageServices, TaskExecutor, TaskRequest, TaskResult};
pub use state_machine::{PackageState, PackageStore, Stage};
