use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    entities::jobs::{InsertJobEntity, JobEntity},
    value_objects::jobs::EnqueueOutcome,
};

#[automock]
#[async_trait]
pub trait JobRepository {
    /// Inserts the job unless a queued or running job holds the same idempotency key.
    async fn enqueue_job(&self, job: InsertJobEntity) -> Result<EnqueueOutcome>;

    /// Claims the oldest due queued job and marks it running.
    async fn lock_next_job(&self, worker_id: &str) -> Result<Option<JobEntity>>;

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobEntity>>;

    async fn find_step_output(&self, job_id: Uuid, step_name: &str) -> Result<Option<Value>>;

    /// First write wins; a repeated save for the same step is ignored.
    async fn save_step_output(&self, job_id: Uuid, step_name: &str, output: Value) -> Result<()>;

    /// Renews the lease of a job still running under `worker_id`.
    /// `false` means the lease was lost to a reclaim.
    async fn touch_job(&self, job_id: Uuid, worker_id: &str) -> Result<bool>;

    // The completion updates below only apply while `worker_id` still holds
    // the job; they return `false` otherwise and change nothing.

    async fn mark_job_done(&self, job_id: Uuid, worker_id: &str) -> Result<bool>;

    async fn schedule_retry(
        &self,
        job_id: Uuid,
        worker_id: &str,
        err: &str,
        run_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn mark_job_dead(&self, job_id: Uuid, worker_id: &str, err: &str) -> Result<bool>;

    /// Requeues running jobs locked before `locked_before`; their worker is presumed dead.
    async fn reclaim_stale_jobs(&self, locked_before: DateTime<Utc>) -> Result<usize>;
}
