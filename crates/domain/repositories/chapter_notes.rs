use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::chapter_notes::{ChapterNotesEntity, InsertChapterNotesEntity};

#[automock]
#[async_trait]
pub trait ChapterNotesRepository {
    /// Writes notes for (course_id, chapter_id), replacing any earlier notes.
    async fn upsert_chapter_notes(&self, notes: InsertChapterNotesEntity) -> Result<()>;

    async fn list_by_course(&self, course_id: &str) -> Result<Vec<ChapterNotesEntity>>;
}
