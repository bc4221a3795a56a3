//! # Job Queue
//!
//! Bounded queue of task requests served by a fixed pool of tokio workers.
//! Callers submit a [`TaskRequest`] and poll the returned [`JobId`]; progress
//! reported by the executor lands in the job's status as it happens.
//!
//! Jobs for different packages run in parallel. Jobs for the same package are
//! serialized by the executor's package lease, not by the queue.
//!
//! Finished jobs stay pollable for `finished_job_retention_seconds` and are
//! evicted on the next submission after that; [`JobQueue::forget`] drops one
//! immediately.

use super::poll::{JobStatus, PollResponse};
use crate::config::QueueConfig;
use crate::orchestration::{ProgressTracker, TaskExecutor, TaskRequest};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job queue is shut down")]
    Closed,

    #[error("Job queue is full (capacity {capacity})")]
    Full { capacity: usize },
}

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug)]
struct QueuedJob {
    id: JobId,
    request: TaskRequest,
}

type JobTable = Arc<DashMap<JobId, JobStatus>>;

pub struct JobQueue {
    sender: Mutex<Option<mpsc::Sender<QueuedJob>>>,
    jobs: JobTable,
    workers: Mutex<Vec<JoinHandle<()>>>,
    capacity: usize,
    retention: Option<Duration>,
}

impl JobQueue {
    /// Spawn `worker_count` workers on the current tokio runtime
    pub fn start(executor: Arc<TaskExecutor>, config: &QueueConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let jobs: JobTable = Arc::new(DashMap::new());
        let timeout = config.job_timeout();

        let workers = (0..config.worker_count.max(1))
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&executor),
                    Arc::clone(&receiver),
                    Arc::clone(&jobs),
                    timeout,
                ))
            })
            .collect();

        info!(
            worker_count = config.worker_count.max(1),
            capacity = capacity,
            job_timeout_seconds = ?config.job_timeout_seconds,
            "Job queue started"
        );

        Self {
            sender: Mutex::new(Some(sender)),
            jobs,
            workers: Mutex::new(workers),
            capacity,
            retention: config.finished_job_retention(),
        }
    }

    /// Queue a request, waiting for room when the queue is full
    ///
    /// Finished jobs past their retention period are evicted first.
    pub async fn submit(&self, request: TaskRequest) -> QueueResult<JobId> {
        self.evict_finished();
        let sender = self.sender.lock().clone().ok_or(QueueError::Closed)?;
        let id = Uuid::new_v4();
        self.jobs.insert(id, JobStatus::pending());

        if sender.send(QueuedJob { id, request }).await.is_err() {
            self.jobs.remove(&id);
            return Err(QueueError::Closed);
        }
        debug!(job_id = %id, "Job submitted");
        Ok(id)
    }

    /// Queue a request without waiting; fails when the queue is full
    pub fn try_submit(&self, request: TaskRequest) -> QueueResult<JobId> {
        self.evict_finished();
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(QueueError::Closed)?;
        let id = Uuid::new_v4();
        self.jobs.insert(id, JobStatus::pending());

        match sender.try_send(QueuedJob { id, request }) {
            Ok(()) => Ok(id),
            Err(e) => {
                self.jobs.remove(&id);
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(QueueError::Full {
                        capacity: self.capacity,
                    }),
                    mpsc::error::TrySendError::Closed(_) => Err(QueueError::Closed),
                }
            }
        }
    }

    pub fn poll(&self, job_id: JobId) -> Option<JobStatus> {
        self.jobs.get(&job_id).map(|status| status.clone())
    }

    pub fn poll_response(&self, job_id: JobId) -> PollResponse {
        match self.jobs.get(&job_id) {
            Some(status) => PollResponse::from(&*status),
            None => PollResponse::unknown(job_id),
        }
    }

    /// Drop the status of a finished job; running jobs are kept
    pub fn forget(&self, job_id: JobId) -> Option<JobStatus> {
        self.jobs
            .remove_if(&job_id, |_, status| status.state.is_terminal())
            .map(|(_, status)| status)
    }

    /// Drop finished jobs older than the retention period, returning how many went
    pub fn evict_finished(&self) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        let Ok(retention) = chrono::Duration::from_std(retention) else {
            return 0;
        };
        let cutoff = Utc::now() - retention;
        let mut evicted = 0;
        self.jobs.retain(|_, status| {
            let keep = !status.finished_before(cutoff);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            debug!(evicted, "Finished jobs evicted");
        }
        evicted
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Stop accepting jobs, let workers drain the queue and wait for them
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if let Err(e) = handle.await {
                error!(error = %e, "Job queue worker terminated abnormally");
            }
        }
        info!("Job queue stopped");
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("capacity", &self.capacity)
            .field("jobs", &self.jobs.len())
            .field("workers", &self.workers.lock().len())
            .finish()
    }
}

async fn worker_loop(
    worker_id: usize,
    executor: Arc<TaskExecutor>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<QueuedJob>>>,
    jobs: JobTable,
    timeout: Option<Duration>,
) {
    debug!(worker_id, "Job queue worker started");
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        run_job(worker_id, &executor, &jobs, job, timeout).await;
    }
    debug!(worker_id, "Job queue worker stopped");
}

async fn run_job(
    worker_id: usize,
    executor: &TaskExecutor,
    jobs: &JobTable,
    job: QueuedJob,
    timeout: Option<Duration>,
) {
    let QueuedJob { id, request } = job;
    crate::log_task!(info, "Job started",
        task_id: request.task_id,
        stage: request.stage,
        job_id: id,
        worker_id: worker_id,
        package_id: request.package_id
    );

    if let Some(mut status) = jobs.get_mut(&id) {
        status.advance(0);
    }
    let progress_jobs = Arc::clone(jobs);
    let tracker = ProgressTracker::new(move |percent| {
        if let Some(mut status) = progress_jobs.get_mut(&id) {
            status.advance(percent);
        }
    });

    let execution = executor.execute(&request, tracker);
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, execution).await {
            Ok(outcome) => Some(outcome),
            Err(_) => None,
        },
        None => Some(execution.await),
    };

    let Some(mut status) = jobs.get_mut(&id) else {
        return;
    };
    match outcome {
        Some(Ok(result)) => {
            crate::log_task!(info, "Job finished",
                task_id: request.task_id,
                stage: request.stage,
                job_id: id,
                success: result.success()
            );
            status.complete(result);
        }
        Some(Err(e)) => {
            error!(job_id = %id, error = %e, "Job failed");
            status.fail(e.to_string());
        }
        None => {
            let seconds = timeout.map(|t| t.as_secs()).unwrap_or_default();
            warn!(job_id = %id, timeout_seconds = seconds, "Job timed out");
            status.fail(format!("Job timed out after {seconds} seconds"));
        }
    }
}
