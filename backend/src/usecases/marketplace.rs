use std::sync::Arc;

use anyhow::anyhow;
use crates::domain::{
    entities::study_materials::CourseEntity,
    repositories::{
        chapter_notes::ChapterNotesRepository, courses::CourseRepository,
        marketplace::MarketplaceRepository, study_type_contents::StudyTypeContentRepository,
    },
    value_objects::{
        courses::StudyTypeContentDto,
        enums::{course_statuses::CourseStatus, study_content_statuses::StudyContentStatus},
        marketplace::{
            MarketplacePage, MarketplaceQuery, PublicCourseDetailDto, PublicCourseDto,
            SlugAssignment,
        },
    },
};
use rand::{Rng, distributions::Alphanumeric};
use tracing::{info, warn};

use crate::usecases::errors::{UseCaseError, UseCaseResult};

pub const SLUG_LENGTH: usize = 10;
const MAX_SLUG_ATTEMPTS: usize = 5;

pub fn random_slug() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}

pub struct MarketplaceUseCase<C, M, N, S>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    course_repository: Arc<C>,
    marketplace_repository: Arc<M>,
    chapter_notes_repository: Arc<N>,
    study_type_content_repository: Arc<S>,
    slug_generator: fn() -> String,
}

impl<C, M, N, S> MarketplaceUseCase<C, M, N, S>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    pub fn new(
        course_repository: Arc<C>,
        marketplace_repository: Arc<M>,
        chapter_notes_repository: Arc<N>,
        study_type_content_repository: Arc<S>,
    ) -> Self {
        Self {
            course_repository,
            marketplace_repository,
            chapter_notes_repository,
            study_type_content_repository,
            slug_generator: random_slug,
        }
    }

    pub fn with_slug_generator(mut self, slug_generator: fn() -> String) -> Self {
        self.slug_generator = slug_generator;
        self
    }

    /// Idempotent: a course that is already public keeps its slug.
    pub async fn publish(&self, course_id: &str, requester: &str) -> UseCaseResult<String> {
        let course = self.find_owned_course(course_id, requester).await?;

        if let (true, Some(slug)) = (course.is_public, course.public_slug.as_ref()) {
            return Ok(slug.clone());
        }
        if course.course_status() != CourseStatus::Ready {
            return Err(UseCaseError::Validation(
                "only ready courses can be published".to_string(),
            ));
        }

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let candidate = (self.slug_generator)();
            match self
                .marketplace_repository
                .assign_public_slug(course_id, &candidate)
                .await?
            {
                SlugAssignment::Assigned(slug) => {
                    info!(course_id, slug, "marketplace: course published");
                    return Ok(slug);
                }
                SlugAssignment::AlreadyPublic(slug) => return Ok(slug),
                SlugAssignment::SlugTaken => {
                    warn!(course_id, attempt, "marketplace: slug collision, retrying");
                }
                SlugAssignment::CourseNotFound => {
                    return Err(UseCaseError::NotFound(format!("course {course_id}")));
                }
            }
        }

        Err(UseCaseError::Internal(anyhow!(
            "no free public slug after {MAX_SLUG_ATTEMPTS} attempts"
        )))
    }

    /// The old slug stops resolving; publishing again issues a new one.
    pub async fn unpublish(&self, course_id: &str, requester: &str) -> UseCaseResult<()> {
        self.find_owned_course(course_id, requester).await?;

        if !self
            .marketplace_repository
            .clear_public_slug(course_id)
            .await?
        {
            return Err(UseCaseError::NotFound(format!("course {course_id}")));
        }

        info!(course_id, "marketplace: course unpublished");
        Ok(())
    }

    pub async fn upvote(&self, course_id: &str) -> UseCaseResult<i32> {
        if let Some(upvotes) = self
            .marketplace_repository
            .increment_upvotes(course_id)
            .await?
        {
            return Ok(upvotes);
        }

        match self.course_repository.find_by_course_id(course_id).await? {
            Some(_) => Err(UseCaseError::Forbidden("course is not public".to_string())),
            None => Err(UseCaseError::NotFound(format!("course {course_id}"))),
        }
    }

    pub async fn list(&self, query: MarketplaceQuery) -> UseCaseResult<MarketplacePage> {
        let (items, total) = self.marketplace_repository.list_public(query.clone()).await?;
        Ok(MarketplacePage::new(items, total, &query))
    }

    pub async fn get_public(&self, slug: &str) -> UseCaseResult<PublicCourseDetailDto> {
        let course = self
            .marketplace_repository
            .find_public_by_slug(slug)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("public course {slug}")))?;

        let chapter_notes = self
            .chapter_notes_repository
            .list_by_course(&course.course_id)
            .await?;
        let study_type_content = self
            .study_type_content_repository
            .list_by_course(&course.course_id, None)
            .await?
            .into_iter()
            .map(StudyTypeContentDto::from)
            .filter(|record| record.status == StudyContentStatus::Ready)
            .collect();

        Ok(PublicCourseDetailDto {
            course_layout: course.course_layout.clone(),
            material: PublicCourseDto::from(course),
            chapter_notes: chapter_notes.into_iter().map(Into::into).collect(),
            study_type_content,
        })
    }

    async fn find_owned_course(
        &self,
        course_id: &str,
        requester: &str,
    ) -> UseCaseResult<CourseEntity> {
        let course = self
            .course_repository
            .find_by_course_id(course_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("course {course_id}")))?;

        if course.created_by != requester {
            return Err(UseCaseError::Forbidden(
                "course belongs to another user".to_string(),
            ));
        }

        Ok(course)
    }
}
