use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::job_statuses::JobStatus,
    infra::db::postgres::schema::jobs,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = jobs)]
pub struct JobEntity {
    pub id: Uuid,
    pub job_type: String,
    pub idempotency_key: String,
    pub payload: Value,
    pub status: String,
    /// Failed executions so far.
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JobEntity {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = jobs)]
pub struct InsertJobEntity {
    pub id: Uuid,
    pub job_type: String,
    pub idempotency_key: String,
    pub payload: Value,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: DateTime<Utc>,
}
