//! `JobRepository`: CRUD plus claim/lease semantics over [`JobRecord`].
//!
//! The record shapes here mirror `worker::JobRecord`/`JobEventRecord`
//! directly; this module only owns the persistence trait and its
//! in-memory test double, not the claim-loop logic (that's `worker`).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::worker::{JobEventRecord, JobRecord, JobStatus, JobTaskRecord};

#[derive(Debug, thiserror::Error)]
pub enum JobRepositoryError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("lease conflict on job {job_id}: held by {holder}")]
    LeaseConflict { job_id: String, holder: String },

    #[error("repository backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: JobRecord) -> Result<JobRecord, JobRepositoryError>;

    async fn get(&self, job_id: &str) -> Result<JobRecord, JobRepositoryError>;

    /// Atomically select and lease one runnable job: `status=queued` or
    /// `status=running AND locked_until < now`, ordered by
    /// `(priority DESC, created_at ASC)`.
    async fn claim(&self, owner: &str, lease_seconds: i64, now: i64) -> Result<Option<JobRecord>, JobRepositoryError>;

    /// Extend the lease on a job this owner currently holds.
    async fn renew_lease(&self, job_id: &str, owner: &str, lease_seconds: i64, now: i64) -> Result<(), JobRepositoryError>;

    async fn update(&self, job: JobRecord) -> Result<JobRecord, JobRepositoryError>;

    async fn append_event(&self, job_id: &str, event: JobEventRecord) -> Result<(), JobRepositoryError>;

    async fn events(&self, job_id: &str) -> Result<Vec<JobEventRecord>, JobRepositoryError>;

    /// Records one named sub-task a handler produced during a run. Unlike
    /// events, tasks are never required: a job with no recorded tasks is
    /// normal.
    async fn record_task(&self, task: JobTaskRecord) -> Result<(), JobRepositoryError>;

    async fn tasks(&self, job_id: &str) -> Result<Vec<JobTaskRecord>, JobRepositoryError>;
}

/// An in-memory repository used by this crate's own tests. Claim order
/// follows `(priority DESC, created_at ASC)` exactly as specified.
#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<HashMap<String, JobRecord>>,
    events: Mutex<HashMap<String, Vec<JobEventRecord>>>,
    tasks: Mutex<HashMap<String, Vec<JobTaskRecord>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: JobRecord) -> Result<JobRecord, JobRepositoryError> {
        let mut jobs = self.jobs.lock().expect("job repository mutex poisoned");
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get(&self, job_id: &str) -> Result<JobRecord, JobRepositoryError> {
        let jobs = self.jobs.lock().expect("job repository mutex poisoned");
        jobs.get(job_id)
            .cloned()
            .ok_or_else(|| JobRepositoryError::NotFound(job_id.to_string()))
    }

    async fn claim(&self, owner: &str, lease_seconds: i64, now: i64) -> Result<Option<JobRecord>, JobRepositoryError> {
        let mut jobs = self.jobs.lock().expect("job repository mutex poisoned");
        let mut candidates: Vec<&mut JobRecord> = jobs
            .values_mut()
            .filter(|j| j.status == JobStatus::Queued || (j.status == JobStatus::Running && j.locked_until.map(|t| t < now).unwrap_or(false)))
            .collect();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)));
        let Some(job) = candidates.into_iter().next() else {
            return Ok(None);
        };
        job.status = JobStatus::Running;
        job.lock_owner = Some(owner.to_string());
        job.locked_until = Some(now + lease_seconds);
        if job.started_at.is_none() {
            job.started_at = Some(now);
        }
        job.attempt += 1;
        Ok(Some(job.clone()))
    }

    async fn renew_lease(&self, job_id: &str, owner: &str, lease_seconds: i64, now: i64) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.lock().expect("job repository mutex poisoned");
        let job = jobs.get_mut(job_id).ok_or_else(|| JobRepositoryError::NotFound(job_id.to_string()))?;
        if job.lock_owner.as_deref() != Some(owner) {
            return Err(JobRepositoryError::LeaseConflict {
                job_id: job_id.to_string(),
                holder: job.lock_owner.clone().unwrap_or_default(),
            });
        }
        job.locked_until = Some(now + lease_seconds);
        Ok(())
    }

    async fn update(&self, job: JobRecord) -> Result<JobRecord, JobRepositoryError> {
        let mut jobs = self.jobs.lock().expect("job repository mutex poisoned");
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn append_event(&self, job_id: &str, event: JobEventRecord) -> Result<(), JobRepositoryError> {
        let mut events = self.events.lock().expect("job repository mutex poisoned");
        events.entry(job_id.to_string()).or_default().push(event);
        Ok(())
    }

    async fn events(&self, job_id: &str) -> Result<Vec<JobEventRecord>, JobRepositoryError> {
        let events = self.events.lock().expect("job repository mutex poisoned");
        Ok(events.get(job_id).cloned().unwrap_or_default())
    }

    async fn record_task(&self, task: JobTaskRecord) -> Result<(), JobRepositoryError> {
        let mut tasks = self.tasks.lock().expect("job repository mutex poisoned");
        tasks.entry(task.job_id.clone()).or_default().push(task);
        Ok(())
    }

    async fn tasks(&self, job_id: &str) -> Result<Vec<JobTaskRecord>, JobRepositoryError> {
        let tasks = self.tasks.lock().expect("job repository mutex poisoned");
        Ok(tasks.get(job_id).cloned().unwrap_or_default())
    }
}
