//! Request and result types exchanged between callers, the job queue and the executor.

use super::task_config::TaskConfig;
use crate::state_machine::Stage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable outcome of one task execution
///
/// Built exactly once by [`TaskLogger::finalize`](super::task_logger::TaskLogger::finalize).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    success: bool,
    log: Vec<String>,
    err: Vec<String>,
}

impl TaskResult {
    pub(crate) fn new(log: Vec<String>, err: Vec<String>) -> Self {
        Self {
            success: err.is_empty(),
            log,
            err,
        }
    }

    /// Failed result that never reached stage work
    pub fn failure(errors: Vec<String>) -> Self {
        Self::new(Vec::new(), errors)
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn err(&self) -> &[String] {
        &self.err
    }

    /// Log lines joined for display
    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }

    /// Error lines joined for display
    pub fn err_text(&self) -> String {
        self.err.join("\n")
    }
}

/// One stage invocation against one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_id: Uuid,
    pub stage: Stage,
    pub package_id: i64,
    pub task_config: TaskConfig,
}

impl TaskRequest {
    /// Request bound to the stage's registered task config
    pub fn new(stage: Stage, package_id: i64) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            stage,
            package_id,
            task_config: stage.default_task_config(),
        }
    }

    pub fn with_task_config(mut self, task_config: TaskConfig) -> Self {
        self.task_config = task_config;
        self
    }
}
