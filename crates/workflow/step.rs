use serde::{Serialize, de::DeserializeOwned};
use std::{future::Future, sync::Arc};
use tracing::debug;
use uuid::Uuid;

use super::WorkflowError;
use crate::domain::repositories::job::JobRepository;

/// Per-execution handle a [`JobHandler`](super::JobHandler) uses to run
/// memoized steps. Shareable across concurrently running steps.
pub struct StepContext {
    job_id: Uuid,
    attempt: i32,
    job_repo: Arc<dyn JobRepository + Send + Sync>,
}

impl StepContext {
    pub fn new(job_id: Uuid, attempt: i32, job_repo: Arc<dyn JobRepository + Send + Sync>) -> Self {
        Self {
            job_id,
            attempt,
            job_repo,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// 1-based execution number of the current job run.
    pub fn attempt(&self) -> i32 {
        self.attempt
    }

    /// Returns the stored output of step `name` if it already completed for
    /// this job, without polling `step`. Otherwise runs `step`, stores its
    /// output and returns it. Failed steps store nothing.
    pub async fn run<T, Fut>(&self, name: &str, step: Fut) -> Result<T, WorkflowError>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T, WorkflowError>>,
    {
        if let Some(output) = self.job_repo.find_step_output(self.job_id, name).await? {
            debug!(job_id = %self.job_id, step = name, "workflow: step replayed from memo");
            return serde_json::from_value(output).map_err(|err| {
                WorkflowError::fatal(format!("stored output of step {name} is unreadable: {err}"))
            });
        }

        let result = step.await?;

        let output = serde_json::to_value(&result).map_err(|err| {
            WorkflowError::fatal(format!("output of step {name} is not serializable: {err}"))
        })?;
        self.job_repo
            .save_step_output(self.job_id, name, output)
            .await?;
        debug!(job_id = %self.job_id, step = name, attempt = self.attempt, "workflow: step completed");

        Ok(result)
    }
}
