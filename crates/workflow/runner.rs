use anyhow::Result;
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Semaphore, time::Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{JobHandler, RetryPolicy, StepContext, WorkflowError};
use crate::{
    domain::{entities::jobs::JobEntity, repositories::job::JobRepository},
    observability::{AlertEvent, AlertNotifier},
};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub worker_id: String,
    /// Jobs executed at the same time by one runner.
    pub concurrency: usize,
    pub poll_interval: Duration,
    /// A running job whose lock is older than this is presumed abandoned.
    pub lease: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Done,
    Retrying { run_at: DateTime<Utc> },
    Dead { error: String },
    /// The job was reclaimed while this runner held it; the new owner decides its fate.
    LeaseLost,
}

pub struct WorkflowRunner {
    job_repo: Arc<dyn JobRepository + Send + Sync>,
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
    settings: WorkerSettings,
    alerts: Option<AlertNotifier>,
}

impl WorkflowRunner {
    pub fn new(job_repo: Arc<dyn JobRepository + Send + Sync>, settings: WorkerSettings) -> Self {
        Self {
            job_repo,
            handlers: HashMap::new(),
            settings,
            alerts: None,
        }
    }

    pub fn register(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(handler.job_type(), handler);
        self
    }

    pub fn with_alerts(mut self, alerts: Option<AlertNotifier>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Polls for due jobs forever, executing up to `concurrency` at a time.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let reclaim_every = self.settings.lease / 2;
        let mut last_reclaim: Option<Instant> = None;

        info!(
            worker_id = %self.settings.worker_id,
            concurrency = self.settings.concurrency,
            job_types = ?self.handlers.keys().collect::<Vec<_>>(),
            "workflow: starting runner loop"
        );

        loop {
            if last_reclaim.is_none_or(|at| at.elapsed() >= reclaim_every) {
                if let Err(err) = self.reclaim_stale_jobs().await {
                    error!(error = %err, "workflow: failed to reclaim stale jobs");
                }
                last_reclaim = Some(Instant::now());
            }

            let permit = Arc::clone(&semaphore).acquire_owned().await?;

            match self.job_repo.lock_next_job(&self.settings.worker_id).await {
                Ok(Some(job)) => {
                    let runner = Arc::clone(&self);
                    tokio::spawn(async move {
                        runner.execute(job).await;
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
                Err(err) => {
                    drop(permit);
                    error!(error = %err, "workflow: error locking next job");
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            }
        }
    }

    /// Claims and executes at most one due job. `None` when nothing is due.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>> {
        match self.job_repo.lock_next_job(&self.settings.worker_id).await? {
            Some(job) => Ok(Some(self.execute(job).await)),
            None => Ok(None),
        }
    }

    /// Runs due jobs one after another until none is left.
    pub async fn drain(&self) -> Result<Vec<JobOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.run_once().await? {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub async fn reclaim_stale_jobs(&self) -> Result<usize> {
        let lease = chrono::Duration::from_std(self.settings.lease)?;
        let reclaimed = self.job_repo.reclaim_stale_jobs(Utc::now() - lease).await?;
        if reclaimed > 0 {
            warn!(reclaimed, "workflow: requeued jobs with expired leases");
        }
        Ok(reclaimed)
    }

    pub async fn execute(&self, job: JobEntity) -> JobOutcome {
        let attempt = job.attempts + 1;

        let Some(handler) = self.handlers.get(job.job_type.as_str()).cloned() else {
            let err = WorkflowError::fatal(format!("no handler registered for {}", job.job_type));
            return self.fail_permanently(&job, None, err).await;
        };

        info!(job_id = %job.id, job_type = %job.job_type, attempt, "workflow: processing job");

        let ctx = StepContext::new(job.id, attempt, Arc::clone(&self.job_repo));
        let result = tokio::select! {
            result = handler.run(&ctx, job.payload.clone()) => result,
            () = self.hold_lease(job.id) => {
                warn!(job_id = %job.id, job_type = %job.job_type, attempt, "workflow: lease lost, abandoning job");
                return JobOutcome::LeaseLost;
            }
        };

        match result {
            Ok(()) => match self.job_repo.mark_job_done(job.id, &self.settings.worker_id).await {
                Ok(true) => {
                    info!(job_id = %job.id, job_type = %job.job_type, attempt, "workflow: job done");
                    JobOutcome::Done
                }
                Ok(false) => self.lease_lost(&job),
                Err(err) => {
                    error!(job_id = %job.id, error = %err, "workflow: failed to mark job done");
                    JobOutcome::Done
                }
            },
            Err(err) if err.is_retryable() && attempt < job.max_attempts => {
                let delay = self.settings.retry.backoff(attempt);
                let run_at = Utc::now()
                    + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());

                warn!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    attempt,
                    max_attempts = job.max_attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "workflow: job failed, scheduling retry"
                );
                match self
                    .job_repo
                    .schedule_retry(job.id, &self.settings.worker_id, &err.to_string(), run_at)
                    .await
                {
                    Ok(true) => JobOutcome::Retrying { run_at },
                    Ok(false) => self.lease_lost(&job),
                    Err(mark_err) => {
                        error!(job_id = %job.id, error = %mark_err, "workflow: failed to schedule retry");
                        JobOutcome::Retrying { run_at }
                    }
                }
            }
            Err(err) => self.fail_permanently(&job, Some(handler), err).await,
        }
    }

    /// Renews the job's lease every third of the lease period. Completes only
    /// once the lease is lost.
    async fn hold_lease(&self, job_id: Uuid) {
        let every = (self.settings.lease / 3).max(Duration::from_millis(10));
        loop {
            tokio::time::sleep(every).await;
            match self.job_repo.touch_job(job_id, &self.settings.worker_id).await {
                Ok(true) => {}
                Ok(false) => return,
                Err(err) => {
                    warn!(job_id = %job_id, error = %err, "workflow: failed to renew lease");
                }
            }
        }
    }

    fn lease_lost(&self, job: &JobEntity) -> JobOutcome {
        warn!(
            job_id = %job.id,
            job_type = %job.job_type,
            worker_id = %self.settings.worker_id,
            "workflow: job was reclaimed before it finished, result discarded"
        );
        JobOutcome::LeaseLost
    }

    async fn fail_permanently(
        &self,
        job: &JobEntity,
        handler: Option<Arc<dyn JobHandler>>,
        err: WorkflowError,
    ) -> JobOutcome {
        let message = err.to_string();

        error!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempts = job.attempts + 1,
            error = %message,
            "workflow: job permanently failed"
        );

        match self
            .job_repo
            .mark_job_dead(job.id, &self.settings.worker_id, &message)
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.lease_lost(job),
            Err(mark_err) => {
                error!(job_id = %job.id, error = %mark_err, "workflow: failed to mark job dead");
            }
        }

        if let Some(handler) = handler {
            if let Err(hook_err) = handler.on_failure(&job.payload, &err).await {
                error!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    error = %hook_err,
                    "workflow: failure handler failed"
                );
            }
        }

        if let Some(alerts) = self.alerts.as_ref() {
            alerts.try_alert(
                AlertEvent::new(alerts.context(), "Job permanently failed", message.clone())
                    .with_field("job_id", job.id)
                    .with_field("job_type", &job.job_type)
                    .with_field("attempts", job.attempts + 1),
            );
        }

        JobOutcome::Dead { error: message }
    }
}
