use std::sync::Arc;

use crates::{
    domain::{
        entities::{
            study_materials::CourseEntity, study_type_contents::InsertStudyTypeContentEntity,
        },
        repositories::{
            courses::CourseRepository, study_type_contents::StudyTypeContentRepository,
        },
        value_objects::{
            course_layout::CourseLayout,
            courses::StudyTypeContentDto,
            enums::{study_content_statuses::StudyContentStatus, study_types::StudyType},
            jobs::{STUDY_CONTENT_JOB, StudyContentPayload, study_content_job_key},
        },
    },
    generation::prompts,
    workflow::JobQueue,
};
use tracing::{error, info};

use crate::usecases::errors::{UseCaseError, UseCaseResult};

pub struct StudyTypeContentUseCase<C, S>
where
    C: CourseRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    course_repository: Arc<C>,
    study_type_content_repository: Arc<S>,
    job_queue: JobQueue,
}

impl<C, S> StudyTypeContentUseCase<C, S>
where
    C: CourseRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    pub fn new(course_repository: Arc<C>, study_type_content_repository: Arc<S>, job_queue: JobQueue) -> Self {
        Self {
            course_repository,
            study_type_content_repository,
            job_queue,
        }
    }

    /// Inserts a `Generating` placeholder and queues the job that fills it.
    pub async fn request_generation(
        &self,
        course_id: &str,
        requester: &str,
        study_type: &str,
    ) -> UseCaseResult<StudyTypeContentDto> {
        let study_type = StudyType::try_from(study_type).map_err(UseCaseError::Validation)?;
        let course = self.find_owned_course(course_id, requester).await?;

        let chapter_titles = course
            .course_layout
            .clone()
            .and_then(|layout| serde_json::from_value::<CourseLayout>(layout).ok())
            .map(|layout| layout.chapter_titles())
            .unwrap_or_default();
        let prompt = prompts::study_content_prompt(study_type, &course.topic, &chapter_titles);

        let record = self
            .study_type_content_repository
            .insert_placeholder(InsertStudyTypeContentEntity {
                course_id: course.course_id.clone(),
                study_type: study_type.to_string(),
                status: StudyContentStatus::Generating.to_string(),
            })
            .await?;

        let payload = StudyContentPayload {
            record_id: record.id,
            course_id: course.course_id.clone(),
            study_type,
            prompt,
        };
        if let Err(err) = self
            .job_queue
            .enqueue(STUDY_CONTENT_JOB, study_content_job_key(record.id), &payload)
            .await
        {
            error!(
                record_id = record.id,
                course_id,
                error = ?err,
                "study_content: failed to enqueue generation"
            );
            // No job will ever fill the placeholder.
            if let Err(cleanup_err) = self
                .study_type_content_repository
                .delete_placeholder(record.id)
                .await
            {
                error!(
                    record_id = record.id,
                    error = ?cleanup_err,
                    "study_content: failed to remove orphaned placeholder"
                );
            }
            return Err(UseCaseError::Internal(err));
        }

        info!(
            record_id = record.id,
            course_id,
            %study_type,
            "study_content: generation queued"
        );

        Ok(StudyTypeContentDto::from(record))
    }

    pub async fn list(
        &self,
        course_id: &str,
        requester: &str,
        study_type: Option<&str>,
    ) -> UseCaseResult<Vec<StudyTypeContentDto>> {
        let study_type = study_type
            .map(StudyType::try_from)
            .transpose()
            .map_err(UseCaseError::Validation)?;
        self.find_owned_course(course_id, requester).await?;

        let records = self
            .study_type_content_repository
            .list_by_course(course_id, study_type)
            .await?;

        Ok(records.into_iter().map(StudyTypeContentDto::from).collect())
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
