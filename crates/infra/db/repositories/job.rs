use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            job_steps::InsertJobStepEntity,
            jobs::{InsertJobEntity, JobEntity},
        },
        repositories::job::JobRepository,
        value_objects::{enums::job_statuses::JobStatus, jobs::EnqueueOutcome},
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{job_steps, jobs},
    },
};

pub struct JobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl JobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn active_statuses() -> [String; 2] {
    [JobStatus::Queued.to_string(), JobStatus::Running.to_string()]
}

#[async_trait]
impl JobRepository for JobPostgres {
    async fn enqueue_job(&self, job: InsertJobEntity) -> Result<EnqueueOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The partial unique index on idempotency_key only covers active jobs,
        // so a conflict means another queued/running job owns the key. The
        // holder may finish between the insert and the lookup; retry once.
        for _ in 0..2 {
            let inserted = insert_into(jobs::table)
                .values(&job)
                .on_conflict_do_nothing()
                .execute(&mut conn)?;

            if inserted > 0 {
                return Ok(EnqueueOutcome::Enqueued(job.id));
            }

            let active = jobs::table
                .filter(jobs::idempotency_key.eq(&job.idempotency_key))
                .filter(jobs::status.eq_any(active_statuses()))
                .select(jobs::id)
                .first::<Uuid>(&mut conn)
                .optional()?;

            if let Some(active_id) = active {
                return Ok(EnqueueOutcome::AlreadyActive(active_id));
            }
        }

        Err(anyhow!(
            "job: could not enqueue job for key {}",
            job.idempotency_key
        ))
    }

    async fn lock_next_job(&self, worker_id: &str) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();

        let job = conn.transaction::<Option<JobEntity>, diesel::result::Error, _>(|conn| {
            let candidate: Option<JobEntity> = jobs::table
                .select(JobEntity::as_select())
                .filter(jobs::status.eq(JobStatus::Queued.to_string()))
                .filter(jobs::run_at.le(current_time))
                .order(jobs::run_at.asc())
                .for_update()
                .skip_locked()
                .first::<JobEntity>(conn)
                .optional()?;

            let Some(job) = candidate else {
                return Ok(None);
            };

            let claimed = diesel::update(jobs::table.find(job.id))
                .set((
                    jobs::status.eq(JobStatus::Running.to_string()),
                    jobs::locked_at.eq(Some(current_time)),
                    jobs::locked_by.eq(Some(worker_id)),
                ))
                .returning(JobEntity::as_returning())
                .get_result::<JobEntity>(conn)?;

            Ok(Some(claimed))
        })?;

        Ok(job)
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let job = jobs::table
            .find(job_id)
            .select(JobEntity::as_select())
            .first::<JobEntity>(&mut conn)
            .optional()?;

        Ok(job)
    }

    async fn find_step_output(&self, job_id: Uuid, step_name: &str) -> Result<Option<Value>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let output = job_steps::table
            .filter(job_steps::job_id.eq(job_id))
            .filter(job_steps::step_name.eq(step_name))
            .select(job_steps::output)
            .first::<Value>(&mut conn)
            .optional()?;

        Ok(output)
    }

    async fn save_step_output(&self, job_id: Uuid, step_name: &str, output: Value) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let step = InsertJobStepEntity {
            job_id,
            step_name: step_name.to_string(),
            output,
        };

        insert_into(job_steps::table)
            .values(&step)
            .on_conflict((job_steps::job_id, job_steps::step_name))
            .do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }

    async fn touch_job(&self, job_id: Uuid, worker_id: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let touched = diesel::update(
            jobs::table
                .find(job_id)
                .filter(jobs::status.eq(JobStatus::Running.to_string()))
                .filter(jobs::locked_by.eq(worker_id)),
        )
        .set(jobs::locked_at.eq(Some(Utc::now())))
        .execute(&mut conn)?;

        Ok(touched > 0)
    }

    async fn mark_job_done(&self, job_id: Uuid, worker_id: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            jobs::table
                .find(job_id)
                .filter(jobs::status.eq(JobStatus::Running.to_string()))
                .filter(jobs::locked_by.eq(worker_id)),
        )
        .set((
            jobs::status.eq(JobStatus::Done.to_string()),
            jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
            jobs::locked_by.eq::<Option<String>>(None),
            jobs::error.eq::<Option<String>>(None),
        ))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn schedule_retry(
        &self,
        job_id: Uuid,
        worker_id: &str,
        err: &str,
        run_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            jobs::table
                .find(job_id)
                .filter(jobs::status.eq(JobStatus::Running.to_string()))
                .filter(jobs::locked_by.eq(worker_id)),
        )
        .set((
            jobs::status.eq(JobStatus::Queued.to_string()),
            jobs::attempts.eq(jobs::attempts + 1),
            jobs::error.eq(Some(err)),
            jobs::run_at.eq(run_at),
            jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
            jobs::locked_by.eq::<Option<String>>(None),
        ))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn mark_job_dead(&self, job_id: Uuid, worker_id: &str, err: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            jobs::table
                .find(job_id)
                .filter(jobs::status.eq(JobStatus::Running.to_string()))
                .filter(jobs::locked_by.eq(worker_id)),
        )
        .set((
            jobs::status.eq(JobStatus::Dead.to_string()),
            jobs::attempts.eq(jobs::attempts + 1),
            jobs::error.eq(Some(err)),
            jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
            jobs::locked_by.eq::<Option<String>>(None),
        ))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn reclaim_stale_jobs(&self, locked_before: DateTime<Utc>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let reclaimed = diesel::update(
            jobs::table
                .filter(jobs::status.eq(JobStatus::Running.to_string()))
                .filter(jobs::locked_at.lt(locked_before)),
        )
        .set((
            jobs::status.eq(JobStatus::Queued.to_string()),
            jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
            jobs::locked_by.eq::<Option<String>>(None),
        ))
        .execute(&mut conn)?;

        Ok(reclaimed)
    }
}
