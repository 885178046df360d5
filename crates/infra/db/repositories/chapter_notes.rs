use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, upsert::excluded};
use std::sync::Arc;

use crate::{
    domain::{
        entities::chapter_notes::{ChapterNotesEntity, InsertChapterNotesEntity},
        repositories::chapter_notes::ChapterNotesRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::chapter_notes},
};

pub struct ChapterNotesPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ChapterNotesPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ChapterNotesRepository for ChapterNotesPostgres {
    async fn upsert_chapter_notes(&self, notes: InsertChapterNotesEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(chapter_notes::table)
            .values(&notes)
            .on_conflict((chapter_notes::course_id, chapter_notes::chapter_id))
            .do_update()
            .set(chapter_notes::notes.eq(excluded(chapter_notes::notes)))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_by_course(&self, course_id: &str) -> Result<Vec<ChapterNotesEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let notes = chapter_notes::table
            .filter(chapter_notes::course_id.eq(course_id))
            .order(chapter_notes::chapter_id.asc())
            .select(ChapterNotesEntity::as_select())
            .load::<ChapterNotesEntity>(&mut conn)?;

        Ok(notes)
    }
}
