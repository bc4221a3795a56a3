//! Job status and the response shapes returned to polling callers.

use crate::orchestration::TaskResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Progress,
    Success,
    Failure,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Progress => "PROGRESS",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        };
        f.write_str(label)
    }
}

/// Current state of one submitted job
///
/// `Success` means the task ran to completion; whether the stage itself
/// succeeded is in `result`. `Failure` is reserved for jobs that never produced
/// a task result (infrastructure fault, timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    pub percent: u8,
    pub result: Option<TaskResult>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn pending() -> Self {
        Self {
            state: JobState::Pending,
            percent: 0,
            result: None,
            error: None,
            finished_at: None,
        }
    }

    /// Record a progress update; ignored once the job is terminal
    pub fn advance(&mut self, percent: u8) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Progress;
        self.percent = self.percent.max(percent.min(100));
    }

    pub fn complete(&mut self, result: TaskResult) {
        self.state = JobState::Success;
        self.percent = 100;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = JobState::Failure;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
    }

    /// Whether the job finished at or before `cutoff`
    pub fn finished_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.finished_at.is_some_and(|at| at <= cutoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub process_percent: u8,
}

/// Polling response, serialized without a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PollResponse {
    /// Task finished; `result` is the stage outcome, `log`/`err` are newline-joined
    Completed {
        success: bool,
        result: bool,
        state: JobState,
        log: String,
        err: String,
    },
    /// Task queued or running
    Running {
        success: bool,
        result: JobState,
        state: JobState,
        info: ProgressInfo,
    },
    /// Job ended without a task result
    Failed {
        success: bool,
        state: JobState,
        errmsg: String,
    },
    /// No job with the requested id
    Unknown { success: bool, errmsg: String },
}

impl PollResponse {
    pub fn unknown(job_id: impl fmt::Display) -> Self {
        Self::Unknown {
            success: false,
            errmsg: format!("Unknown job: {job_id}"),
        }
    }
}

impl From<&JobStatus> for PollResponse {
    fn from(status: &JobStatus) -> Self {
        match (status.state, &status.result) {
            (JobState::Success, Some(result)) => Self::Completed {
                success: true,
                result: result.success(),
                state: JobState::Success,
                log: result.log_text(),
                err: result.err_text(),
            },
            (JobState::Pending | JobState::Progress, _) => Self::Running {
                success: true,
                result: status.state,
                state: status.state,
                info: ProgressInfo {
                    process_percent: status.percent,
                },
            },
            _ => Self::Failed {
                success: false,
                state: status.state,
                errmsg: status
                    .error
                    .clone()
                    .unwrap_or_else(|| "Job finished without a result".to_string()),
            },
        }
    }
}
