use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    entities::study_materials::CourseEntity,
    value_objects::marketplace::{MarketplaceQuery, SlugAssignment},
};

#[automock]
#[async_trait]
pub trait MarketplaceRepository {
    async fn assign_public_slug(&self, course_id: &str, slug: &str) -> Result<SlugAssignment>;

    /// Makes the course private and clears its slug. Returns `false` if the
    /// course does not exist.
    async fn clear_public_slug(&self, course_id: &str) -> Result<bool>;

    /// Atomically increments upvotes of a public course. `None` when the
    /// course is missing or not public.
    async fn increment_upvotes(&self, course_id: &str) -> Result<Option<i32>>;

    async fn find_public_by_slug(&self, slug: &str) -> Result<Option<CourseEntity>>;

    async fn list_public(&self, query: MarketplaceQuery) -> Result<(Vec<CourseEntity>, i64)>;
}
