use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::chapter_notes;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, PartialEq)]
#[diesel(table_name = chapter_notes)]
pub struct ChapterNotesEntity {
    pub id: i32,
    pub course_id: String,
    /// 1-based position of the chapter in the course layout.
    pub chapter_id: i32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, PartialEq)]
#[diesel(table_name = chapter_notes)]
pub struct InsertChapterNotesEntity {
    pub course_id: String,
    pub chapter_id: i32,
    pub notes: String,
}
