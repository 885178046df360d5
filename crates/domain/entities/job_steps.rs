use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::infra::db::postgres::schema::job_steps;

#[derive(Debug, Clone, Selectable, Queryable, PartialEq)]
#[diesel(table_name = job_steps)]
pub struct JobStepEntity {
    pub job_id: Uuid,
    pub step_name: String,
    pub output: Value,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = job_steps)]
pub struct InsertJobStepEntity {
    pub job_id: Uuid,
    pub step_name: String,
    pub output: Value,
}
