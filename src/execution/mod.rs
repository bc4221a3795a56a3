//! # Execution
//!
//! Asynchronous execution of task requests: a bounded job queue served by a
//! worker pool, and the status shapes callers poll.

pub mod job_queue;
pub mod poll;

pub use job_queue::{JobId, JobQueue, QueueError, QueueResult};
pub use poll::{JobState, JobStatus, PollResponse, ProgressInfo};
