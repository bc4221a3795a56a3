//! Job queue submission, polling and shutdown.

mod common;

use common::IngestFixture;
use ingest_core::config::QueueConfig;
use ingest_core::constants::status_codes;
use ingest_core::execution::{JobQueue, JobState, JobStatus, PollResponse, QueueError};
use ingest_core::orchestration::{
    run_blocking, StageContext, StageHandler, StageRegistry, StageResult, TaskExecutor,
    TaskRequest,
};
use ingest_core::state_machine::{PackageStore, Stage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

async fn wait_for_terminal(queue: &JobQueue, job_id: Uuid) -> JobStatus {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let status = queue.poll(job_id).expect("job should be tracked");
            if status.state.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not finish in time")
}

fn queue_config(job_timeout_seconds: Option<u64>) -> QueueConfig {
    QueueConfig {
        worker_count: 2,
        capacity: 8,
        job_timeout_seconds,
        ..QueueConfig::default()
    }
}

#[tokio::test]
async fn test_completed_job_reports_stage_result() {
    let fixture = IngestFixture::new();
    let archive = fixture.write_sip("SIP-Q1", 2);
    let record = fixture.seed(&archive, status_codes::NEW, None).await;
    let queue = JobQueue::start(fixture.executor(), &queue_config(None));

    let job_id = queue
        .submit(TaskRequest::new(Stage::DeliveryValidation, record.id))
        .await
        .unwrap();
    let status = wait_for_terminal(&queue, job_id).await;

    assert_eq!(status.state, JobState::Success);
    assert_eq!(status.percent, 100);
    match queue.poll_response(job_id) {
        PollResponse::Completed {
            success,
            result,
            state,
            log,
            err,
        } => {
            assert!(success);
            assert!(result);
            assert_eq!(state, JobState::Success);
            assert!(log.contains("SIPDeliveryValidation task"));
            assert!(err.is_empty());
        }
        other => panic!("unexpected poll response: {other:?}"),
    }
    assert_eq!(
        fixture.record(record.id).await.statusprocess,
        status_codes::DELIVERY_VALIDATED
    );
    queue.shutdown().await;
}

#[tokio::test]
async fn test_failed_stage_still_completes_the_job() {
    let fixture = IngestFixture::new();
    let archive = fixture.write_sip("SIP-Q2", 1);
    let record = fixture.seed(&archive, 50, None).await;
    let queue = JobQueue::start(fixture.executor(), &queue_config(None));

    let job_id = queue
        .submit(TaskRequest::new(Stage::IdentifierAssignment, record.id))
        .await
        .unwrap();
    let status = wait_for_terminal(&queue, job_id).await;

    assert_eq!(status.state, JobState::Success);
    let result = status.result.expect("completed job carries a result");
    assert!(!result.success());

    let json = serde_json::to_value(queue.poll_response(job_id)).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["result"], false);
    assert_eq!(json["state"], "SUCCESS");
    assert!(json["err"].as_str().unwrap().contains("status==100"));
    queue.shutdown().await;
}

#[tokio::test]
async fn test_unknown_job_poll() {
    let fixture = IngestFixture::new();
    let queue = JobQueue::start(fixture.executor(), &queue_config(None));
    let missing = Uuid::new_v4();

    assert!(queue.poll(missing).is_none());
    let json = serde_json::to_value(queue.poll_response(missing)).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["errmsg"], format!("Unknown job: {missing}"));
    queue.shutdown().await;
}

#[tokio::test]
async fn test_jobs_for_different_packages_run_concurrently() {
    let fixture = IngestFixture::new();
    let queue = JobQueue::start(fixture.executor(), &queue_config(None));

    let mut jobs = Vec::new();
    for index in 0..4 {
        let archive = fixture.write_sip(&format!("SIP-C{index}"), 2);
        let record = fixture.seed(&archive, status_codes::NEW, None).await;
        let job_id = queue
            .submit(TaskRequest::new(Stage::DeliveryValidation, record.id))
            .await
            .unwrap();
        jobs.push((job_id, record.id));
    }

    for (job_id, package_id) in jobs {
        let status = wait_for_terminal(&queue, job_id).await;
        assert_eq!(status.state, JobState::Success);
        assert_eq!(
            fixture.record(package_id).await.statusprocess,
            status_codes::DELIVERY_VALIDATED
        );
    }
    queue.shutdown().await;
}

#[tokio::test]
async fn test_forget_only_drops_finished_jobs() {
    let fixture = IngestFixture::new();
    let archive = fixture.write_sip("SIP-Q3", 1);
    let record = fixture.seed(&archive, status_codes::NEW, None).await;
    let queue = JobQueue::start(fixture.executor(), &queue_config(None));

    let job_id = queue
        .submit(TaskRequest::new(Stage::DeliveryValidation, record.id))
        .await
        .unwrap();
    wait_for_terminal(&queue, job_id).await;

    assert!(queue.forget(job_id).is_some());
    assert!(queue.poll(job_id).is_none());
    assert_eq!(queue.job_count(), 0);
    queue.shutdown().await;
}

#[tokio::test]
async fn test_submit_after_shutdown_is_rejected() {
    let fixture = IngestFixture::new();
    let queue = JobQueue::start(fixture.executor(), &queue_config(None));
    queue.shutdown().await;

    let request = TaskRequest::new(Stage::Reset, 1);
    assert_eq!(queue.submit(request.clone()).await, Err(QueueError::Closed));
    assert_eq!(queue.try_submit(request), Err(QueueError::Closed));
    assert_eq!(queue.job_count(), 0);
}

#[derive(Debug)]
struct SlowValidation;

#[async_trait::async_trait]
impl StageHandler for SlowValidation {
    fn stage(&self) -> Stage {
        Stage::AipValidation
    }

    async fn run(&self, _ctx: &mut StageContext) -> StageResult<()> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_job_timeout_marks_job_failed() {
    let fixture = IngestFixture::new();
    let archive = fixture.write_sip("SIP-Q4", 1);
    let record = fixture.seed(&archive, status_codes::AIP_CREATED, None).await;

    let registry = StageRegistry::new().with_handler(Stage::AipValidation, Arc::new(SlowValidation));
    let store: Arc<dyn PackageStore> = fixture.store.clone();
    let executor = Arc::new(
        TaskExecutor::with_registry(store, Arc::clone(&fixture.config), fixture.services(), registry)
            .unwrap(),
    );
    let queue = JobQueue::start(executor, &queue_config(Some(1)));

    let job_id = queue
        .submit(TaskRequest::new(Stage::AipValidation, record.id))
        .await
        .unwrap();
    let status = wait_for_terminal(&queue, job_id).await;

    assert_eq!(status.state, JobState::Failure);
    assert_eq!(status.error.as_deref(), Some("Job timed out after 1 seconds"));
    match queue.poll_response(job_id) {
        PollResponse::Failed { success, errmsg, .. } => {
            assert!(!success);
            assert!(errmsg.contains("timed out"));
        }
        other => panic!("unexpected poll response: {other:?}"),
    }
    assert_eq!(
        fixture.record(record.id).await.statusprocess,
        status_codes::AIP_CREATED
    );
    queue.shutdown().await;
}

/// Validation doing synchronous work, as archive and checksum stages do
struct BlockingValidation;

#[async_trait::async_trait]
impl StageHandler for BlockingValidation {
    fn stage(&self) -> Stage {
        Stage::AipValidation
    }

    async fn run(&self, ctx: &mut StageContext) -> StageResult<()> {
        run_blocking(ctx, |logger| {
            std::thread::sleep(Duration::from_secs(3));
            logger.add_info("Blocking validation finished");
            Ok(())
        })
        .await
    }
}

#[tokio::test]
async fn test_timeout_fires_during_blocking_stage_work() {
    let fixture = IngestFixture::new();
    let archive = fixture.write_sip("SIP-Q5", 1);
    let record = fixture.seed(&archive, status_codes::AIP_CREATED, None).await;

    let registry =
        StageRegistry::new().with_handler(Stage::AipValidation, Arc::new(BlockingValidation));
    let store: Arc<dyn PackageStore> = fixture.store.clone();
    let executor = Arc::new(
        TaskExecutor::with_registry(store, Arc::clone(&fixture.config), fixture.services(), registry)
            .unwrap(),
    );
    let queue = JobQueue::start(executor, &queue_config(Some(1)));

    let started = Instant::now();
    let job_id = queue
        .submit(TaskRequest::new(Stage::AipValidation, record.id))
        .await
        .unwrap();
    let status = wait_for_terminal(&queue, job_id).await;

    assert!(started.elapsed() < Duration::from_millis(2500), "{:?}", started.elapsed());
    assert_eq!(status.state, JobState::Failure);
    assert_eq!(status.error.as_deref(), Some("Job timed out after 1 seconds"));
    assert_eq!(
        fixture.record(record.id).await.statusprocess,
        status_codes::AIP_CREATED
    );
    queue.shutdown().await;
}

#[tokio::test]
async fn test_blocking_stage_work_keeps_its_log() {
    let fixture = IngestFixture::new();
    let archive = fixture.write_sip("SIP-Q6", 1);
    let record = fixture.seed(&archive, status_codes::AIP_CREATED, None).await;

    let registry =
        StageRegistry::new().with_handler(Stage::AipValidation, Arc::new(BlockingValidation));
    let store: Arc<dyn PackageStore> = fixture.store.clone();
    let executor =
        TaskExecutor::with_registry(store, Arc::clone(&fixture.config), fixture.services(), registry)
            .unwrap();

    let result = fixture.run(&executor, Stage::AipValidation, record.id).await;

    assert!(result.success(), "errors: {:?}", result.err());
    assert!(result
        .log()
        .iter()
        .any(|line| line == "Blocking validation finished"));
    assert_eq!(
        fixture.record(record.id).await.statusprocess,
        status_codes::AIP_VALIDATED
    );
}

#[tokio::test]
async fn test_finished_jobs_are_evicted_after_retention() {
    let fixture = IngestFixture::new();
    let first = fixture
        .seed(&fixture.write_sip("SIP-Q7", 1), status_codes::NEW, None)
        .await;
    let second = fixture
        .seed(&fixture.write_sip("SIP-Q8", 1), status_codes::NEW, None)
        .await;
    let config = QueueConfig {
        finished_job_retention_seconds: Some(0),
        ..queue_config(None)
    };
    let queue = JobQueue::start(fixture.executor(), &config);

    let first_job = queue
        .submit(TaskRequest::new(Stage::DeliveryValidation, first.id))
        .await
        .unwrap();
    wait_for_terminal(&queue, first_job).await;
    assert_eq!(queue.job_count(), 1);

    let second_job = queue
        .submit(TaskRequest::new(Stage::DeliveryValidation, second.id))
        .await
        .unwrap();

    assert!(queue.poll(first_job).is_none());
    assert!(queue.poll(second_job).is_some());
    wait_for_terminal(&queue, second_job).await;
    assert_eq!(queue.evict_finished(), 1);
    assert_eq!(queue.job_count(), 0);
    queue.shutdown().await;
}

#[tokio::test]
async fn test_finished_jobs_are_kept_without_retention() {
    let fixture = IngestFixture::new();
    let record = fixture
        .seed(&fixture.write_sip("SIP-Q9", 1), status_codes::NEW, None)
        .await;
    let config = QueueConfig {
        finished_job_retention_seconds: None,
        ..queue_config(None)
    };
    let queue = JobQueue::start(fixture.executor(), &config);

    let job_id = queue
        .submit(TaskRequest::new(Stage::DeliveryValidation, record.id))
        .await
        .unwrap();
    let status = wait_for_terminal(&queue, job_id).await;

    assert!(status.finished_at.is_some());
    assert_eq!(queue.evict_finished(), 0);
    assert!(queue.forget(job_id).is_some());
    assert_eq!(queue.job_count(), 0);
    queue.shutdown().await;
}
