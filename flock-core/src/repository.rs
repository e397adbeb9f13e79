use async_trait::async_trait;
use uuid::Uuid;

use crate::job::{Job, JobResult};
use crate::CoreResult;

/// Repository trait for durable job and result storage, keyed by job id.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create_job(&self, job: &Job) -> CoreResult<()>;

    async fn fetch_job(&self, id: Uuid) -> CoreResult<Option<Job>>;

    /// Conditional pending -> running transition. Returns the claimed job,
    /// or None when the job is missing or no longer pending; at most one
    /// caller can ever receive Some for a given job.
    async fn claim_job(&self, id: Uuid) -> CoreResult<Option<Job>>;

    /// Persist the final result and flip the job to complete atomically.
    /// A partially written result must never be visible as complete.
    async fn complete_job(&self, id: Uuid, result: &JobResult) -> CoreResult<()>;

    /// Terminal failure: record the cause and the terminal timestamp.
    async fn fail_job(&self, id: Uuid, error: &str) -> CoreResult<()>;

    async fn fetch_result(&self, id: Uuid) -> CoreResult<Option<JobResult>>;
}

/// Hand-off seam to the message broker: one message per job, consumed by at
/// most one worker at a time. Redelivery on worker loss is the broker's
/// concern.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn publish_job(&self, id: Uuid) -> CoreResult<()>;
}
