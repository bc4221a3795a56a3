//! # Orchestration Engine
//!
//! Executes pipeline stages against information packages.
//!
//! ## Core Components
//!
//! - **TaskExecutor**: loads the record, checks preconditions, runs the stage
//!   handler and commits the outcome status
//! - **StageRegistry**: static table of stage handlers validated at startup
//! - **StageHandler**: one implementation per pipeline stage
//! - **TaskConfig**: status precondition and outcome codes of a stage
//! - **TaskLogger**: per-task log that becomes the [`TaskResult`]
//! - **ProgressTracker**: monotonic, advisory progress reporting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ingest_core::config::IngestConfig;
//! use ingest_core::orchestration::{ProgressTracker, StageServices, TaskExecutor, TaskRequest};
//! use ingest_core::state_machine::{InMemoryPackageStore, Stage};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(IngestConfig::default());
//! let services = StageServices::from_config(&config)?;
//! let executor = TaskExecutor::new(Arc::new(InMemoryPackageStore::new()), config, services)?;
//!
//! let result = executor
//!     .execute(&TaskRequest::new(Stage::DeliveryValidation, 1), ProgressTracker::silent())
//!     .await?;
//! println!("success: {}", result.success());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod errors;
pub mod executor;
pub mod progress;
pub mod stage_registry;
pub mod stages;
pub mod task_config;
pub mod task_logger;
pub mod types;

pub use context::{StageContext, StageServices};
pub use errors::{OrchestrationError, OrchestrationResult, StageError, StageResult};
pub use executor::TaskExecutor;
pub use progress::{percent_of, ProgressTracker};
pub use stage_registry::StageRegistry;
pub use stages::{run_blocking, StageHandler};
pub use task_config::TaskConfig;
pub use task_logger::TaskLogger;
pub use types::{TaskRequest, TaskResult};
