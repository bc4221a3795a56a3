//! # Task Executor
//!
//! Runs one stage against one information package and records the outcome.
//!
//! ## Execution Flow
//!
//! 1. Acquire the package lease (one execution per package at a time)
//! 2. Load the record; a missing record fails the task without writing anything
//! 3. Assign a working directory uuid if the stage needs one and none exists
//! 4. Check the status predicate and stage preconditions; violations fail the
//!    task without doing any work or changing the status
//! 5. Check the stage's input files; a missing input fails the stage and
//!    records its error status
//! 6. Run the stage handler, catching errors and panics
//! 7. Commit the success or error status with an optimistic version check
//!
//! Every stage-level problem ends up in the returned [`TaskResult`]. Only
//! infrastructure faults (store unavailable) are returned as `Err`.

use super::context::{StageContext, StageServices};
use super::errors::{panic_message, OrchestrationResult, StageError};
use super::progress::ProgressTracker;
use super::stage_registry::StageRegistry;
use super::task_logger::TaskLogger;
use super::types::{TaskRequest, TaskResult};
use crate::config::IngestConfig;
use crate::state_machine::{collect_violations, ExpectedStatusGuard, PackageStore};
use crate::storage::PackageLayout;
use dashmap::DashMap;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

pub struct TaskExecutor {
    store: Arc<dyn PackageStore>,
    config: Arc<IngestConfig>,
    services: StageServices,
    registry: StageRegistry,
    leases: DashMap<i64, Arc<Mutex<()>>>,
}

impl TaskExecutor {
    /// Executor with the built-in stage handlers
    pub fn new(
        store: Arc<dyn PackageStore>,
        config: Arc<IngestConfig>,
        services: StageServices,
    ) -> OrchestrationResult<Self> {
        Self::with_registry(store, config, services, StageRegistry::new())
    }

    /// Executor with a custom registry; the registry is validated up front
    pub fn with_registry(
        store: Arc<dyn PackageStore>,
        config: Arc<IngestConfig>,
        services: StageServices,
        registry: StageRegistry,
    ) -> OrchestrationResult<Self> {
        registry.validate()?;
        Ok(Self {
            store,
            config,
            services,
            registry,
            leases: DashMap::new(),
        })
    }

    pub fn store(&self) -> &Arc<dyn PackageStore> {
        &self.store
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    fn lease(&self, package_id: i64) -> Arc<Mutex<()>> {
        self.leases
            .entry(package_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Execute `request`, reporting progress through `progress`
    #[instrument(
        skip_all,
        fields(task_id = %request.task_id, stage = %request.stage, package_id = request.package_id)
    )]
    pub async fn execute(
        &self,
        request: &TaskRequest,
        progress: ProgressTracker,
    ) -> OrchestrationResult<TaskResult> {
        let handler = self.registry.get(request.stage)?;
        let lease = self.lease(request.package_id);
        let _guard = lease.lock().await;

        crate::log_task!(debug, "Task started",
            task_id: request.task_id,
            stage: request.stage,
            package_id: request.package_id
        );

        let Some(original) = self.store.get(request.package_id).await? else {
            crate::log_package!(warn, "Record not found", package_id: request.package_id);
            return Ok(TaskResult::failure(vec![format!(
                "Information package {} not found",
                request.package_id
            )]));
        };

        let mut record = original.clone();
        let mut preamble = Vec::new();
        if handler.needs_working_directory() && !record.has_uuid() {
            record.uuid = Uuid::new_v4().to_string();
            preamble.push(format!("New UUID assigned: {}", record.uuid));
        }
        let layout = PackageLayout::for_package(&self.config.paths.work, &record);

        let status_guard = ExpectedStatusGuard::new(&request.task_config);
        let mut violations = collect_violations(&record, &[&status_guard]);
        violations.extend(handler.check_preconditions(&record, &layout, &self.config));
        if !violations.is_empty() {
            crate::log_task!(info, "Preconditions not met",
                task_id: request.task_id,
                stage: request.stage,
                status: record.statusprocess,
                violations: violations
            );
            return Ok(TaskResult::failure(violations));
        }
        let missing_inputs = handler.check_inputs(&record, &layout, &self.config);

        let mut prepare_error = None;
        let logger = match handler.log_file_name() {
            Some(name) if handler.needs_working_directory() => match layout.prepare() {
                Ok(()) => TaskLogger::with_file(layout.log_file(name)),
                Err(e) => {
                    prepare_error = Some(StageError::io("creating working directory", e));
                    TaskLogger::in_memory()
                }
            },
            _ => {
                if handler.needs_working_directory() {
                    if let Err(e) = layout.prepare() {
                        prepare_error = Some(StageError::io("creating working directory", e));
                    }
                }
                TaskLogger::in_memory()
            }
        };

        let mut ctx = StageContext {
            task_id: request.task_id,
            record,
            layout,
            logger,
            progress: progress.clone(),
            config: Arc::clone(&self.config),
            services: self.services.clone(),
        };
        ctx.logger.add_info(format!(
            "{} task {}",
            request.stage.display_name(),
            request.task_id
        ));
        for line in preamble {
            ctx.logger.add_info(line);
        }
        progress.report(1);

        let outcome = if let Some(e) = prepare_error {
            Err(e)
        } else if !missing_inputs.is_empty() {
            crate::log_task!(warn, "Stage inputs missing",
                task_id: request.task_id,
                stage: request.stage,
                missing: missing_inputs
            );
            for line in missing_inputs {
                ctx.logger.add_error(line);
            }
            Ok(())
        } else {
            AssertUnwindSafe(handler.run(&mut ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StageError::Panicked(panic_message(panic))))
        };

        let StageContext {
            mut record,
            mut logger,
            ..
        } = ctx;

        if let Err(e) = &outcome {
            crate::log_task!(error, "Stage failed",
                task_id: request.task_id,
                stage: request.stage,
                error: e.to_string()
            );
            logger.add_error(format!("An error occurred: {e}"));
        }

        let succeeded = outcome.is_ok() && !logger.has_errors();
        record.statusprocess = request.task_config.outcome_status(succeeded);

        if record.same_content(&original) {
            crate::log_package!(debug, "Record unchanged, commit skipped", package_id: record.id);
        } else {
            match self.store.save(&record).await {
                Ok(saved) => {
                    crate::log_package!(debug, "Record saved",
                        package_id: saved.id,
                        status: saved.statusprocess,
                        version: saved.version
                    );
                }
                Err(e) if e.is_conflict() => {
                    crate::log_package!(warn, "Concurrent modification",
                        package_id: record.id,
                        error: e.to_string()
                    );
                    logger.add_error(format!("Status update rejected: {e}"));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let result = logger.finalize();
        if result.success() {
            progress.report(100);
        }

        crate::log_task!(info, "Task finished",
            task_id: request.task_id,
            stage: request.stage,
            success: result.success(),
            status: record.statusprocess
        );
        Ok(result)
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("registry", &self.registry)
            .field("active_leases", &self.leases.len())
            .finish_non_exhaustive()
    }
}
