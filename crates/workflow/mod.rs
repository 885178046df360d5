//! Durable step workflows on top of the `jobs` and `job_steps` tables.
//!
//! A job is a row in `jobs`; its handler runs named steps through
//! [`StepContext::run`], and every completed step's output is stored in
//! `job_steps`. A re-executed job (retry, reclaimed lease) replays stored
//! outputs instead of repeating side effects.

pub mod runner;
pub mod step;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::{fmt::Display, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    entities::jobs::InsertJobEntity,
    repositories::job::JobRepository,
    value_objects::{
        enums::job_statuses::JobStatus, generation::GenerationError, jobs::EnqueueOutcome,
    },
};

pub use runner::{JobOutcome, WorkerSettings, WorkflowRunner};
pub use step::StepContext;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("retryable: {0}")]
    Retryable(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl WorkflowError {
    pub fn retryable(err: impl Display) -> Self {
        WorkflowError::Retryable(err.to_string())
    }

    pub fn fatal(err: impl Display) -> Self {
        WorkflowError::Fatal(err.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::Retryable(_))
    }
}

impl From<GenerationError> for WorkflowError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Transient(message) => WorkflowError::Retryable(message),
            GenerationError::Fatal(message) => WorkflowError::Fatal(message),
        }
    }
}

/// Storage and plumbing failures are assumed to be temporary.
impl From<anyhow::Error> for WorkflowError {
    fn from(err: anyhow::Error) -> Self {
        WorkflowError::Retryable(format!("{err:#}"))
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    fn job_type(&self) -> &'static str;

    async fn run(&self, ctx: &StepContext, payload: Value) -> Result<(), WorkflowError>;

    /// Runs once, after the job is marked dead.
    async fn on_failure(&self, _payload: &Value, _error: &WorkflowError) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retrying after the `failed_attempts`-th failure:
    /// `base * 2^(failed_attempts - 1)`, capped at `max_delay`.
    pub fn backoff(&self, failed_attempts: i32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).clamp(0, 31) as u32;
        self.base_delay
            .checked_mul(2u32.saturating_pow(exponent))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
        }
    }
}

/// Producer side: inserts jobs for the worker to pick up.
#[derive(Clone)]
pub struct JobQueue {
    job_repo: Arc<dyn JobRepository + Send + Sync>,
    max_attempts: i32,
}

impl JobQueue {
    pub fn new(job_repo: Arc<dyn JobRepository + Send + Sync>, max_attempts: i32) -> Self {
        Self {
            job_repo,
            max_attempts: max_attempts.max(1),
        }
    }

    /// While a job with `idempotency_key` is queued or running, returns that
    /// job instead of adding another.
    pub async fn enqueue<P: Serialize>(
        &self,
        job_type: &str,
        idempotency_key: String,
        payload: &P,
    ) -> Result<EnqueueOutcome> {
        let job = InsertJobEntity {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            idempotency_key,
            payload: serde_json::to_value(payload)?,
            status: JobStatus::Queued.to_string(),
            attempts: 0,
            max_attempts: self.max_attempts,
            run_at: Utc::now(),
        };
        let key = job.idempotency_key.clone();

        let outcome = self.job_repo.enqueue_job(job).await?;
        match outcome {
            EnqueueOutcome::Enqueued(job_id) => {
                info!(%job_id, job_type, idempotency_key = %key, "workflow: job enqueued")
            }
            EnqueueOutcome::AlreadyActive(job_id) => {
                info!(%job_id, job_type, idempotency_key = %key, "workflow: job already active")
            }
        }

        Ok(outcome)
    }
}
