use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use vantage::capability::{InMemoryBroker, InMemoryJobRepository, JobRepository};
use vantage::worker::{HandlerError, JobEventSink, JobHandler, JobRecord, JobStatus, Worker};

struct EchoHandler;

#[async_trait]
impl JobHandler for EchoHandler {
    async fn handle(&self, job: &JobRecord, events: &JobEventSink) -> Result<serde_json::Value, HandlerError> {
        events.emit("started", serde_json::json!({}), 0).await.ok();
        Ok(job.payload.clone())
    }
}

struct TaskRecordingHandler;

#[async_trait]
impl JobHandler for TaskRecordingHandler {
    async fn handle(&self, job: &JobRecord, events: &JobEventSink) -> Result<serde_json::Value, HandlerError> {
        events
            .record_task("fetch_schema", serde_json::json!({"table": "orders"}), Ok(serde_json::json!({"columns": 4})), 0)
            .await
            .ok();
        Ok(job.payload.clone())
    }
}

/// Fails on its first attempt (retryable), succeeds on redelivery.
struct FlakyHandler {
    attempts: AtomicU32,
}

impl FlakyHandler {
    fn new() -> Self {
        Self { attempts: AtomicU32::new(0) }
    }
}

#[async_trait]
impl JobHandler for FlakyHandler {
    async fn handle(&self, job: &JobRecord, _events: &JobEventSink) -> Result<serde_json::Value, HandlerError> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(HandlerError::retryable("connector timeout"))
        } else {
            Ok(job.payload.clone())
        }
    }
}

#[tokio::test]
async fn a_retryable_failure_requeues_and_a_later_tick_succeeds() {
    let repo = Arc::new(InMemoryJobRepository::new());
    let broker = Arc::new(InMemoryBroker::new());
    repo.create(JobRecord::new("j1", "org", "flaky", serde_json::json!({"n": 7}), 0, 3, 0))
        .await
        .unwrap();

    let mut worker = Worker::new("w1", repo.clone(), broker);
    worker.register("flaky", Arc::new(FlakyHandler::new()));

    let first = worker.tick(10).await.unwrap().unwrap();
    assert_eq!(first.status, JobStatus::Queued);
    assert_eq!(first.attempt, 1);

    let second = worker.tick(20).await.unwrap().unwrap();
    assert_eq!(second.status, JobStatus::Succeeded);
    assert_eq!(second.result, Some(serde_json::json!({"n": 7})));
}

#[tokio::test]
async fn tick_dispatches_highest_priority_job_first() {
    let repo = Arc::new(InMemoryJobRepository::new());
    let broker = Arc::new(InMemoryBroker::new());
    repo.create(JobRecord::new("low", "org", "echo", serde_json::json!({"which": "low"}), 0, 3, 0))
        .await
        .unwrap();
    repo.create(JobRecord::new("high", "org", "echo", serde_json::json!({"which": "high"}), 5, 3, 0))
        .await
        .unwrap();

    let mut worker = Worker::new("w1", repo, broker);
    worker.register("echo", Arc::new(EchoHandler));

    let claimed = worker.tick(10).await.unwrap().unwrap();
    assert_eq!(claimed.id, "high");
}

#[tokio::test]
async fn an_unregistered_job_type_fails_the_job_without_panicking() {
    let repo = Arc::new(InMemoryJobRepository::new());
    let broker = Arc::new(InMemoryBroker::new());
    repo.create(JobRecord::new("j1", "org", "unknown_type", serde_json::json!({}), 0, 3, 0))
        .await
        .unwrap();

    let worker = Worker::new("w1", repo.clone(), broker);
    let err = worker.tick(10).await.unwrap_err();
    assert!(matches!(err, vantage::worker::WorkerError::NoHandler(ref t) if t == "unknown_type"));

    let stored = repo.get("j1").await.unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}

#[tokio::test]
async fn renewing_a_lease_held_by_this_worker_succeeds() {
    let repo = Arc::new(InMemoryJobRepository::new());
    let broker = Arc::new(InMemoryBroker::new());
    repo.create(JobRecord::new("j1", "org", "echo", serde_json::json!({}), 0, 3, 0))
        .await
        .unwrap();

    let worker = Worker::new("w1", repo.clone(), broker);
    repo.claim("w1", 30, 0).await.unwrap();
    worker.renew_lease("j1", 20).await.unwrap();

    let stored = repo.get("j1").await.unwrap();
    assert_eq!(stored.locked_until, Some(50));
}

#[tokio::test]
async fn events_emitted_during_handling_are_recorded_in_order() {
    let repo = Arc::new(InMemoryJobRepository::new());
    let broker = Arc::new(InMemoryBroker::new());
    repo.create(JobRecord::new("j1", "org", "echo", serde_json::json!({"n": 1}), 0, 3, 0))
        .await
        .unwrap();

    let mut worker = Worker::new("w1", repo.clone(), broker);
    worker.register("echo", Arc::new(EchoHandler));
    worker.tick(10).await.unwrap();

    let events = repo.events("j1").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "started");
    assert_eq!(events[0].monotonic_index, 0);
}

#[tokio::test]
async fn a_task_recorded_during_handling_is_scoped_to_its_job() {
    let repo = Arc::new(InMemoryJobRepository::new());
    let broker = Arc::new(InMemoryBroker::new());
    repo.create(JobRecord::new("j1", "org", "analyst", serde_json::json!({"n": 1}), 0, 3, 0))
        .await
        .unwrap();

    let mut worker = Worker::new("w1", repo.clone(), broker);
    worker.register("analyst", Arc::new(TaskRecordingHandler));
    worker.tick(10).await.unwrap();

    let tasks = repo.tasks("j1").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].job_id, "j1");
    assert_eq!(tasks[0].task_name, "fetch_schema");
    assert_eq!(tasks[0].result, Some(serde_json::json!({"columns": 4})));
}
