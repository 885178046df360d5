use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::infra::db::postgres::schema::study_type_contents;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = study_type_contents)]
pub struct StudyTypeContentEntity {
    pub id: i32,
    pub course_id: String,
    pub study_type: String,
    pub content: Option<Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = study_type_contents)]
pub struct InsertStudyTypeContentEntity {
    pub course_id: String,
    pub study_type: String,
    pub status: String,
}
