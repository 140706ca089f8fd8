//! Worker job lifecycle: claim, lease, dispatch, and terminal transitions
//! over jobs held in a [`crate::capability::JobRepository`].
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         Worker::tick                        │
//! │  claim (lease) -> dispatch to JobHandler -> terminal update  │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod dispatch;
mod record;

pub use dispatch::{HandlerError, JobEventSink, JobHandler, Worker, WorkerError};
pub use record::{JobEventRecord, JobRecord, JobStatus, JobTaskRecord};
