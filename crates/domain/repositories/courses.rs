use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::{
        study_materials::{CourseEntity, InsertCourseEntity},
        youtube_recommendations::YoutubeRecommendationEntity,
    },
    value_objects::enums::course_statuses::CourseStatus,
};

#[automock]
#[async_trait]
pub trait CourseRepository {
    async fn create_course(&self, course: InsertCourseEntity) -> Result<CourseEntity>;

    async fn find_by_course_id(&self, course_id: &str) -> Result<Option<CourseEntity>>;

    async fn list_by_owner(&self, email: &str) -> Result<Vec<CourseEntity>>;

    /// Moves a `Generating` course to `status`. Returns `false` when the course
    /// is missing or already terminal.
    async fn update_status_from_generating(
        &self,
        course_id: &str,
        status: CourseStatus,
    ) -> Result<bool>;

    /// Deletes chapter notes, study-type content and YouTube recommendations,
    /// then the course itself, in one transaction.
    async fn delete_course_cascade(&self, course_id: &str) -> Result<()>;

    async fn list_youtube_recommendations(
        &self,
        course_id: &str,
    ) -> Result<Vec<YoutubeRecommendationEntity>>;
}
