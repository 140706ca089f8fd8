//! Job record types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`JobRecord`]. Transitions obey
/// `queued -> running -> {succeeded|failed|cancelled}`, with
/// `failed -> queued` permitted only via retry while `attempt < max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Running)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Failed, Queued)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub organisation_id: String,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub headers: HashMap<String, String>,
    pub status: JobStatus,
    pub priority: i32,
    pub attempt: u32,
    pub max_attempts: u32,
    pub lock_owner: Option<String>,
    pub locked_until: Option<i64>,
    pub progress: u8,
    pub status_message: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl JobRecord {
    pub fn new(id: impl Into<String>, organisation_id: impl Into<String>, job_type: impl Into<String>, payload: serde_json::Value, priority: i32, max_attempts: u32, created_at: i64) -> Self {
        Self {
            id: id.into(),
            organisation_id: organisation_id.into(),
            job_type: job_type.into(),
            payload,
            headers: HashMap::new(),
            status: JobStatus::Queued,
            priority,
            attempt: 0,
            max_attempts,
            lock_owner: None,
            locked_until: None,
            progress: 0,
            status_message: None,
            result: None,
            error: None,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// `lock_owner == None` iff `locked_until == None`; this invariant is
    /// maintained by every lock/unlock path in this module.
    pub fn lease_invariant_holds(&self) -> bool {
        self.lock_owner.is_some() == self.locked_until.is_some()
    }

    pub fn mark_succeeded(&mut self, result: serde_json::Value, now: i64) {
        self.status = JobStatus::Succeeded;
        self.result = Some(result);
        self.progress = 100;
        self.finished_at = Some(now);
        self.lock_owner = None;
        self.locked_until = None;
    }

    /// Marks `failed`. If the error is retryable and attempts remain, the
    /// job is put back to `queued` instead so a later claim can retry it.
    pub fn mark_failed(&mut self, error: impl Into<String>, retryable: bool, now: i64) {
        self.error = Some(error.into());
        self.lock_owner = None;
        self.locked_until = None;
        if retryable && self.attempt < self.max_attempts {
            self.status = JobStatus::Queued;
        } else {
            self.status = JobStatus::Failed;
            self.finished_at = Some(now);
        }
    }

    pub fn mark_cancelled(&mut self, now: i64) {
        self.status = JobStatus::Cancelled;
        self.finished_at = Some(now);
        self.lock_owner = None;
        self.locked_until = None;
    }
}

/// Appended monotonically to a job's event log; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEventRecord {
    pub event_type: String,
    pub details: serde_json::Value,
    pub monotonic_index: u64,
    pub created_at: i64,
}

impl JobEventRecord {
    pub fn new(event_type: impl Into<String>, details: serde_json::Value, monotonic_index: u64, created_at: i64) -> Self {
        Self {
            event_type: event_type.into(),
            details,
            monotonic_index,
            created_at,
        }
    }
}

/// One named sub-task a handler recorded during a run, distinct from the
/// monotonic event log: a handler may break its work into named steps
/// (e.g. `"fetch_schema"`, `"run_query"`) and record each one's own
/// parameters and outcome. Optional — most jobs never produce any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTaskRecord {
    pub id: String,
    pub job_id: String,
    pub task_name: String,
    pub parameters: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
    pub created_at: i64,
}

impl JobTaskRecord {
    pub fn new(id: impl Into<String>, job_id: impl Into<String>, task_name: impl Into<String>, parameters: serde_json::Value, created_at: i64) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            task_name: task_name.into(),
            parameters,
            result: None,
            error: None,
            created_at,
        }
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: serde_json::Value) -> Self {
        self.error = Some(error);
        self
    }
}
