use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    domain::{
        entities::study_type_contents::{InsertStudyTypeContentEntity, StudyTypeContentEntity},
        repositories::study_type_contents::StudyTypeContentRepository,
        value_objects::enums::{
            study_content_statuses::StudyContentStatus, study_types::StudyType,
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::study_type_contents},
};

pub struct StudyTypeContentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StudyTypeContentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StudyTypeContentRepository for StudyTypeContentPostgres {
    async fn insert_placeholder(
        &self,
        record: InsertStudyTypeContentEntity,
    ) -> Result<StudyTypeContentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(study_type_contents::table)
            .values(&record)
            .returning(StudyTypeContentEntity::as_returning())
            .get_result::<StudyTypeContentEntity>(&mut conn)?;

        Ok(created)
    }

    async fn find_by_id(&self, record_id: i32) -> Result<Option<StudyTypeContentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = study_type_contents::table
            .find(record_id)
            .select(StudyTypeContentEntity::as_select())
            .first::<StudyTypeContentEntity>(&mut conn)
            .optional()?;

        Ok(record)
    }

    async fn delete_placeholder(&self, record_id: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::delete(
            study_type_contents::table
                .find(record_id)
                .filter(study_type_contents::status.eq(StudyContentStatus::Generating.to_string())),
        )
        .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_ready(&self, record_id: i32, content: Value) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(study_type_contents::table.find(record_id))
            .set((
                study_type_contents::content.eq(Some(content)),
                study_type_contents::status.eq(StudyContentStatus::Ready.to_string()),
            ))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn list_by_course(
        &self,
        course_id: &str,
        study_type: Option<StudyType>,
    ) -> Result<Vec<StudyTypeContentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = study_type_contents::table
            .filter(study_type_contents::course_id.eq(course_id))
            .into_boxed();

        if let Some(study_type) = study_type {
            query = query.filter(study_type_contents::study_type.eq(study_type.to_string()));
        }

        let records = query
            .order(study_type_contents::id.asc())
            .select(StudyTypeContentEntity::as_select())
            .load::<StudyTypeContentEntity>(&mut conn)?;

        Ok(records)
    }
}
