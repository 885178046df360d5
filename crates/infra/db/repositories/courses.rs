use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::{
            study_materials::{CourseEntity, InsertCourseEntity},
            youtube_recommendations::YoutubeRecommendationEntity,
        },
        repositories::courses::CourseRepository,
        value_objects::enums::course_statuses::CourseStatus,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{chapter_notes, study_materials, study_type_contents, youtube_recommendations},
    },
};

pub struct CoursePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CoursePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CourseRepository for CoursePostgres {
    async fn create_course(&self, course: InsertCourseEntity) -> Result<CourseEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(study_materials::table)
            .values(&course)
            .returning(CourseEntity::as_returning())
            .get_result::<CourseEntity>(&mut conn)?;

        Ok(created)
    }

    async fn find_by_course_id(&self, course_id: &str) -> Result<Option<CourseEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let course = study_materials::table
            .filter(study_materials::course_id.eq(course_id))
            .select(CourseEntity::as_select())
            .first::<CourseEntity>(&mut conn)
            .optional()?;

        Ok(course)
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<CourseEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let courses = study_materials::table
            .filter(study_materials::created_by.eq(email))
            .order((study_materials::created_at.desc(), study_materials::id.desc()))
            .select(CourseEntity::as_select())
            .load::<CourseEntity>(&mut conn)?;

        Ok(courses)
    }

    async fn update_status_from_generating(
        &self,
        course_id: &str,
        status: CourseStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(
            study_materials::table
                .filter(study_materials::course_id.eq(course_id))
                .filter(study_materials::status.eq(CourseStatus::Generating.to_string())),
        )
        .set(study_materials::status.eq(status.to_string()))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn delete_course_cascade(&self, course_id: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(chapter_notes::table.filter(chapter_notes::course_id.eq(course_id)))
                .execute(conn)?;
            diesel::delete(
                study_type_contents::table.filter(study_type_contents::course_id.eq(course_id)),
            )
            .execute(conn)?;
            diesel::delete(
                youtube_recommendations::table
                    .filter(youtube_recommendations::course_id.eq(course_id)),
            )
            .execute(conn)?;
            diesel::delete(study_materials::table.filter(study_materials::course_id.eq(course_id)))
                .execute(conn)?;
            Ok(())
        })?;

        Ok(())
    }

    async fn list_youtube_recommendations(
        &self,
        course_id: &str,
    ) -> Result<Vec<YoutubeRecommendationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let recommendations = youtube_recommendations::table
            .filter(youtube_recommendations::course_id.eq(course_id))
            .order(youtube_recommendations::id.asc())
            .select(YoutubeRecommendationEntity::as_select())
            .load::<YoutubeRecommendationEntity>(&mut conn)?;

        Ok(recommendations)
    }
}
