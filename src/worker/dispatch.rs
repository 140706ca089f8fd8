//! Worker claim/dispatch loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::capability::{JobRepository, JobRepositoryError, MessageBroker, MessageType};

use super::record::{JobEventRecord, JobRecord, JobTaskRecord};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("job repository error: {0}")]
    Repository(#[from] JobRepositoryError),

    #[error("no handler registered for job type: {0}")]
    NoHandler(String),
}

/// A handler processes one job's payload to completion, reporting progress
/// through the given [`JobEventSink`]. Handlers MUST be idempotent: the
/// same job may be redelivered after a lease expires.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &JobRecord, events: &JobEventSink) -> Result<serde_json::Value, HandlerError>;
}

/// A handler-reported failure, tagged with whether the worker should retry.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    pub retryable: bool,
}

impl HandlerError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: true }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self { message: message.into(), retryable: false }
    }
}

/// Emits progress events for one job, deduplicating by `(event_type,
/// monotonic_index)` so at-least-once delivery can't double-append.
pub struct JobEventSink<'a> {
    job_id: String,
    repository: &'a dyn JobRepository,
    broker: &'a dyn MessageBroker,
    next_index: std::sync::atomic::AtomicU64,
}

impl<'a> JobEventSink<'a> {
    fn new(job_id: String, repository: &'a dyn JobRepository, broker: &'a dyn MessageBroker) -> Self {
        Self {
            job_id,
            repository,
            broker,
            next_index: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub async fn emit(&self, event_type: &str, details: serde_json::Value, now: i64) -> Result<(), WorkerError> {
        let index = self.next_index.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let event = JobEventRecord::new(event_type, details.clone(), index, now);
        self.repository.append_event(&self.job_id, event).await?;
        let _ = self
            .broker
            .publish(
                MessageType::JobProgress,
                serde_json::json!({"jobId": self.job_id, "eventType": event_type, "details": details}),
            )
            .await;
        Ok(())
    }

    /// Records one named sub-task's outcome. Optional: most handlers never
    /// call this and only ever emit progress events.
    pub async fn record_task(&self, task_name: &str, parameters: serde_json::Value, outcome: Result<serde_json::Value, serde_json::Value>, now: i64) -> Result<(), WorkerError> {
        let id = uuid::Uuid::new_v4().to_string();
        let task = match outcome {
            Ok(result) => JobTaskRecord::new(id, self.job_id.clone(), task_name, parameters, now).with_result(result),
            Err(error) => JobTaskRecord::new(id, self.job_id.clone(), task_name, parameters, now).with_error(error),
        };
        self.repository.record_task(task).await?;
        Ok(())
    }
}

/// `{ id, queue, handlers_by_message_type, lease_duration, max_attempts }`.
pub struct Worker {
    pub id: String,
    pub lease_seconds: i64,
    pub max_claim_attempts: u32,
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    repository: Arc<dyn JobRepository>,
    broker: Arc<dyn MessageBroker>,
}

impl Worker {
    pub fn new(id: impl Into<String>, repository: Arc<dyn JobRepository>, broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            id: id.into(),
            lease_seconds: 30,
            max_claim_attempts: 5,
            handlers: HashMap::new(),
            repository,
            broker,
        }
    }

    pub fn register(&mut self, job_type: impl Into<String>, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(job_type.into(), handler);
    }

    /// Runs one claim-dispatch-complete cycle. Returns `Ok(None)` if there
    /// was nothing runnable to claim; callers loop this with their own
    /// backoff policy between iterations.
    pub async fn tick(&self, now: i64) -> Result<Option<JobRecord>, WorkerError> {
        let mut attempts = 0;
        let job = loop {
            match self.repository.claim(&self.id, self.lease_seconds, now).await {
                Ok(Some(job)) => break job,
                Ok(None) => return Ok(None),
                Err(err) => {
                    attempts += 1;
                    if attempts >= self.max_claim_attempts {
                        return Err(err.into());
                    }
                }
            }
        };

        let Some(handler) = self.handlers.get(&job.job_type) else {
            let mut failed = job.clone();
            failed.mark_failed(format!("no handler for job_type {}", job.job_type), false, now);
            self.repository.update(failed).await?;
            return Err(WorkerError::NoHandler(job.job_type.clone()));
        };

        let sink = JobEventSink::new(job.id.clone(), self.repository.as_ref(), self.broker.as_ref());
        let mut finished = job.clone();
        match handler.handle(&job, &sink).await {
            Ok(result) => finished.mark_succeeded(result, now),
            Err(err) => finished.mark_failed(err.message, err.retryable, now),
        }
        let updated = self.repository.update(finished).await?;
        let _ = self
            .broker
            .publish(
                MessageType::JobStatusChanged,
                serde_json::json!({"jobId": updated.id, "status": updated.status}),
            )
            .await;
        Ok(Some(updated))
    }

    /// Extends the lease on a job this worker holds, for handlers running
    /// long enough to outlive the initial lease window.
    pub async fn renew_lease(&self, job_id: &str, now: i64) -> Result<(), WorkerError> {
        self.repository.renew_lease(job_id, &self.id, self.lease_seconds, now).await?;
        Ok(())
    }

    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_seconds.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{InMemoryBroker, InMemoryJobRepository};

    struct EchoHandler;

    #[async_trait]
    impl JobHandler for EchoHandler {
        async fn handle(&self, job: &JobRecord, events: &JobEventSink) -> Result<serde_json::Value, HandlerError> {
            events.emit("started", serde_json::json!({}), 0).await.ok();
            Ok(job.payload.clone())
        }
    }

    struct AlwaysFailsHandler;

    #[async_trait]
    impl JobHandler for AlwaysFailsHandler {
        async fn handle(&self, _job: &JobRecord, _events: &JobEventSink) -> Result<serde_json::Value, HandlerError> {
            Err(HandlerError::terminal("bad payload"))
        }
    }

    #[tokio::test]
    async fn test_tick_claims_dispatches_and_completes() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let broker = Arc::new(InMemoryBroker::new());
        repo.create(JobRecord::new("j1", "org", "echo", serde_json::json!({"n": 1}), 0, 3, 0))
            .await
            .unwrap();
        let mut worker = Worker::new("w1", repo.clone(), broker);
        worker.register("echo", Arc::new(EchoHandler));
        let result = worker.tick(10).await.unwrap().unwrap();
        assert_eq!(result.status, super::super::record::JobStatus::Succeeded);
        assert_eq!(result.result, Some(serde_json::json!({"n": 1})));
    }

    #[tokio::test]
    async fn test_record_task_round_trips_through_the_repository() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let broker = Arc::new(InMemoryBroker::new());
        let sink = JobEventSink::new("j1".into(), repo.as_ref(), broker.as_ref());
        sink.record_task("fetch_schema", serde_json::json!({"table": "orders"}), Ok(serde_json::json!({"columns": 4})), 10)
            .await
            .unwrap();

        let tasks = repo.tasks("j1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_name, "fetch_schema");
        assert_eq!(tasks[0].result, Some(serde_json::json!({"columns": 4})));
        assert!(tasks[0].error.is_none());
    }

    #[tokio::test]
    async fn test_tick_returns_none_when_queue_empty() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let broker = Arc::new(InMemoryBroker::new());
        let worker = Worker::new("w1", repo, broker);
        assert!(worker.tick(10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_terminal_failure_does_not_retry() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let broker = Arc::new(InMemoryBroker::new());
        repo.create(JobRecord::new("j1", "org", "fails", serde_json::json!({}), 0, 3, 0))
            .await
            .unwrap();
        let mut worker = Worker::new("w1", repo.clone(), broker);
        worker.register("fails", Arc::new(AlwaysFailsHandler));
        let result = worker.tick(10).await.unwrap().unwrap();
        assert_eq!(result.status, super::super::record::JobStatus::Failed);
    }
}
