use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::{
    domain::value_objects::enums::course_statuses::CourseStatus,
    infra::db::postgres::schema::study_materials,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = study_materials)]
pub struct CourseEntity {
    pub id: i32,
    pub course_id: String,
    pub created_by: String,
    pub topic: String,
    pub difficulty_level: String,
    pub course_type: String,
    pub course_layout: Option<Value>,
    pub status: String,
    pub is_public: bool,
    pub public_slug: Option<String>,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
}

impl CourseEntity {
    pub fn course_status(&self) -> CourseStatus {
        CourseStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = study_materials)]
pub struct InsertCourseEntity {
    pub course_id: String,
    pub created_by: String,
    pub topic: String,
    pub difficulty_level: String,
    pub course_type: String,
    pub course_layout: Option<Value>,
    pub status: String,
    pub is_public: bool,
}
