use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;

use crate::domain::{
    entities::study_type_contents::{InsertStudyTypeContentEntity, StudyTypeContentEntity},
    value_objects::enums::study_types::StudyType,
};

#[automock]
#[async_trait]
pub trait StudyTypeContentRepository {
    async fn insert_placeholder(
        &self,
        record: InsertStudyTypeContentEntity,
    ) -> Result<StudyTypeContentEntity>;

    async fn find_by_id(&self, record_id: i32) -> Result<Option<StudyTypeContentEntity>>;

    /// Removes a placeholder whose generation job could not be queued.
    async fn delete_placeholder(&self, record_id: i32) -> Result<()>;

    /// Stores `content` and flips the row to `Ready`. Returns `false` when the
    /// row does not exist.
    async fn mark_ready(&self, record_id: i32, content: Value) -> Result<bool>;

    async fn list_by_course(
        &self,
        course_id: &str,
        study_type: Option<StudyType>,
    ) -> Result<Vec<StudyTypeContentEntity>>;
}
