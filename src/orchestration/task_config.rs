use crate::state_machine::StatusPredicate;
use serde::{Deserialize, Serialize};

/// Per-stage contract: required predecessor status plus the two outcome codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub expected_status: StatusPredicate,
    pub success_status: i32,
    pub error_status: i32,
}

impl TaskConfig {
    pub fn new(expected_status: StatusPredicate, success_status: i32, error_status: i32) -> Self {
        Self {
            expected_status,
            success_status,
            error_status,
        }
    }

    /// Violations of the status precondition; empty when `current` satisfies it
    pub fn validate(&self, current: i32) -> Vec<String> {
        self.expected_status.violations(current)
    }

    /// Status to commit for a finished stage
    pub fn outcome_status(&self, succeeded: bool) -> i32 {
        if succeeded {
            self.success_status
        } else {
            self.error_status
        }
    }
}
