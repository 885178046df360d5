use std::sync::Arc;

use crates::{
    domain::{
        entities::study_materials::{CourseEntity, InsertCourseEntity},
        repositories::{
            chapter_notes::ChapterNotesRepository, courses::CourseRepository,
            study_type_contents::StudyTypeContentRepository, users::UserRepository,
        },
        value_objects::{
            courses::{CourseDetailDto, CourseDto, CreateCourseModel},
            enums::course_statuses::CourseStatus,
            jobs::{NOTES_GENERATION_JOB, NotesGenerationPayload, notes_job_key},
        },
    },
    generation::{ContentGenerators, prompts},
    workflow::JobQueue,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    entitlements::EntitlementUseCase,
    errors::{UseCaseError, UseCaseResult},
};

pub struct CourseUseCase<C, N, S, U>
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    course_repository: Arc<C>,
    chapter_notes_repository: Arc<N>,
    study_type_content_repository: Arc<S>,
    entitlements: Arc<EntitlementUseCase<U>>,
    generators: ContentGenerators,
    job_queue: JobQueue,
}

impl<C, N, S, U> CourseUseCase<C, N, S, U>
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(
        course_repository: Arc<C>,
        chapter_notes_repository: Arc<N>,
        study_type_content_repository: Arc<S>,
        entitlements: Arc<EntitlementUseCase<U>>,
        generators: ContentGenerators,
        job_queue: JobQueue,
    ) -> Self {
        Self {
            course_repository,
            chapter_notes_repository,
            study_type_content_repository,
            entitlements,
            generators,
            job_queue,
        }
    }

    /// Generates the layout synchronously, spends a credit, persists the
    /// course as `Generating` and hands notes generation to the worker.
    pub async fn create_course(
        &self,
        owner: &str,
        model: CreateCourseModel,
    ) -> UseCaseResult<CourseDto> {
        let topic = model.topic.trim();
        let difficulty_level = model.difficulty_level.trim();
        let course_type = model.course_type.trim();
        if topic.is_empty() || difficulty_level.is_empty() || course_type.is_empty() {
            return Err(UseCaseError::Validation(
                "topic, difficulty level and course type are required".to_string(),
            ));
        }

        // Deny early so an exhausted user does not cost a model call.
        let status = self.entitlements.get_status(owner).await?;
        if !status.is_member && status.credits <= 0 {
            return Err(UseCaseError::EntitlementExhausted { remaining: 0 });
        }

        let prompt = prompts::course_layout_prompt(topic, course_type, difficulty_level);
        let layout = self.generators.generate_layout(&prompt).await.map_err(|err| {
            warn!(owner, topic, error = %err, "courses: layout generation failed");
            UseCaseError::from(err)
        })?;

        let decision = self.entitlements.check_and_consume_credit(owner).await?;
        if !decision.granted {
            return Err(UseCaseError::EntitlementExhausted {
                remaining: decision.remaining_credits,
            });
        }

        let course_layout = serde_json::to_value(&layout).map_err(anyhow::Error::from)?;
        let course = self
            .course_repository
            .create_course(InsertCourseEntity {
                course_id: Uuid::new_v4().to_string(),
                created_by: owner.to_string(),
                topic: topic.to_string(),
                difficulty_level: difficulty_level.to_string(),
                course_type: course_type.to_string(),
                course_layout: Some(course_layout),
                status: CourseStatus::Generating.to_string(),
                is_public: false,
            })
            .await
            .map_err(|err| {
                error!(owner, db_error = ?err, "courses: failed to persist course");
                err
            })?;

        let payload = NotesGenerationPayload {
            course_id: course.course_id.clone(),
        };
        if let Err(err) = self
            .job_queue
            .enqueue(
                NOTES_GENERATION_JOB,
                notes_job_key(&course.course_id),
                &payload,
            )
            .await
        {
            error!(
                course_id = %course.course_id,
                error = ?err,
                "courses: failed to enqueue notes generation"
            );
            if let Err(status_err) = self
                .course_repository
                .update_status_from_generating(&course.course_id, CourseStatus::Error)
                .await
            {
                error!(
                    course_id = %course.course_id,
                    db_error = ?status_err,
                    "courses: failed to mark course as errored"
                );
            }
            return Err(UseCaseError::Internal(err));
        }

        info!(
            course_id = %course.course_id,
            owner,
            chapters = layout.chapters.len(),
            remaining_credits = decision.remaining_credits,
            "courses: course created, notes generation queued"
        );

        Ok(CourseDto::from(course))
    }

    pub async fn get_course(&self, course_id: &str) -> UseCaseResult<CourseDto> {
        let course = self.find_course(course_id).await?;
        Ok(CourseDto::from(course))
    }

    pub async fn get_course_detail(
        &self,
        course_id: &str,
        requester: &str,
    ) -> UseCaseResult<CourseDetailDto> {
        let course = self.find_owned_course(course_id, requester).await?;

        let chapter_notes = self
            .chapter_notes_repository
            .list_by_course(course_id)
            .await?;
        let study_type_contents = self
            .study_type_content_repository
            .list_by_course(course_id, None)
            .await?;
        let youtube_recommendations = self
            .course_repository
            .list_youtube_recommendations(course_id)
            .await?;

        Ok(CourseDetailDto {
            course: CourseDto::from(course),
            chapter_notes: chapter_notes.into_iter().map(Into::into).collect(),
            study_type_contents: study_type_contents.into_iter().map(Into::into).collect(),
            youtube_recommendations: youtube_recommendations
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }

    pub async fn list_by_owner(&self, owner: &str) -> UseCaseResult<Vec<CourseDto>> {
        let courses = self.course_repository.list_by_owner(owner).await?;
        Ok(courses.into_iter().map(CourseDto::from).collect())
    }

    /// Only leaves `Generating`; returns `false` if the course was already terminal.
    pub async fn set_status(&self, course_id: &str, status: CourseStatus) -> UseCaseResult<bool> {
        self.find_course(course_id).await?;

        let updated = self
            .course_repository
            .update_status_from_generating(course_id, status)
            .await?;
        if !updated {
            warn!(course_id, %status, "courses: status already terminal, update skipped");
        }

        Ok(updated)
    }

    pub async fn delete_course(&self, course_id: &str, requester: &str) -> UseCaseResult<()> {
        self.find_owned_course(course_id, requester).await?;

        self.course_repository
            .delete_course_cascade(course_id)
            .await
            .map_err(|err| {
                error!(course_id, db_error = ?err, "courses: cascade delete failed");
                err
            })?;

        info!(course_id, requester, "courses: course deleted");
        Ok(())
    }

    async fn find_course(&self, course_id: &str) -> UseCaseResult<CourseEntity> {
        self.course_repository
            .find_by_course_id(course_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("course {course_id}")))
    }

    async fn find_owned_course(
        &self,
        course_id: &str,
        requester: &str,
    ) -> UseCaseResult<CourseEntity> {
        let course = self.find_course(course_id).await?;
        if course.created_by != requester {
            return Err(UseCaseError::Forbidden(
                "course belongs to another user".to_string(),
            ));
        }
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::users::UserEntity,
        repositories::{
            chapter_notes::MockChapterNotesRepository, courses::MockCourseRepository,
            generative_model::MockGenerativeModel, job::MockJobRepository,
            study_type_contents::MockStudyTypeContentRepository, users::MockUserRepository,
        },
        value_objects::{generation::GenerationError, jobs::EnqueueOutcome},
    };
    use mockall::predicate::eq;

    const OWNER: &str = "owner@example.com";
    const LAYOUT_JSON: &str =
        r#"{"courseTitle":"Rust","chapters":[{"chapterTitle":"Intro"},{"chapterTitle":"Ownership"}]}"#;

    fn user(credits: i32, is_member: bool) -> UserEntity {
        UserEntity {
            id: 1,
            email: OWNER.to_string(),
            user_name: "Owner".to_string(),
            credits,
            is_member,
            customer_id: None,
            created_at: Utc::now(),
        }
    }

    fn stored(course: InsertCourseEntity) -> CourseEntity {
        CourseEntity {
            id: 1,
            course_id: course.course_id,
            created_by: course.created_by,
            topic: course.topic,
            difficulty_level: course.difficulty_level,
            course_type: course.course_type,
            course_layout: course.course_layout,
            status: course.status,
            is_public: course.is_public,
            public_slug: None,
            upvotes: 0,
            created_at: Utc::now(),
        }
    }

    fn sample_course(course_id: &str, owner: &str) -> CourseEntity {
        CourseEntity {
            id: 1,
            course_id: course_id.to_string(),
            created_by: owner.to_string(),
            topic: "Rust".to_string(),
            difficulty_level: "Easy".to_string(),
            course_type: "Exam".to_string(),
            course_layout: None,
            status: CourseStatus::Ready.to_string(),
            is_public: false,
            public_slug: None,
            upvotes: 0,
            created_at: Utc::now(),
        }
    }

    fn model_answering(answer: Result<String, GenerationError>) -> MockGenerativeModel {
        let mut model = MockGenerativeModel::new();
        model
            .expect_generate()
            .returning(move |_, _| answer.clone());
        model
    }

    fn build(
        course_repo: MockCourseRepository,
        user_repo: MockUserRepository,
        model: MockGenerativeModel,
        job_repo: MockJobRepository,
    ) -> CourseUseCase<
        MockCourseRepository,
        MockChapterNotesRepository,
        MockStudyTypeContentRepository,
        MockUserRepository,
    > {
        CourseUseCase::new(
            Arc::new(course_repo),
            Arc::new(MockChapterNotesRepository::new()),
            Arc::new(MockStudyTypeContentRepository::new()),
            Arc::new(EntitlementUseCase::new(Arc::new(user_repo), 5)),
            ContentGenerators::uniform(Arc::new(model)),
            JobQueue::new(Arc::new(job_repo), 3),
        )
    }

    fn create_model() -> CreateCourseModel {
        CreateCourseModel {
            topic: "Rust".to_string(),
            difficulty_level: "Easy".to_string(),
            course_type: "Exam".to_string(),
        }
    }

    #[tokio::test]
    async fn create_course_persists_generating_and_enqueues_notes_job() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(3, false))));
        user_repo
            .expect_consume_credit_if_available()
            .times(1)
            .returning(|_| Ok(Some(2)));

        let mut course_repo = MockCourseRepository::new();
        course_repo
            .expect_create_course()
            .withf(|course| {
                course.status == "Generating"
                    && !course.is_public
                    && course.created_by == OWNER
                    && course.course_layout.is_some()
            })
            .times(1)
            .returning(|course| Ok(stored(course)));
        course_repo.expect_update_status_from_generating().never();

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_enqueue_job()
            .withf(|job| {
                job.job_type == NOTES_GENERATION_JOB && job.idempotency_key.starts_with("notes:")
            })
            .times(1)
            .returning(|job| Ok(EnqueueOutcome::Enqueued(job.id)));

        let usecase = build(
            course_repo,
            user_repo,
            model_answering(Ok(LAYOUT_JSON.to_string())),
            job_repo,
        );
        let course = usecase.create_course(OWNER, create_model()).await.unwrap();

        assert_eq!(course.status, CourseStatus::Generating);
        assert_eq!(course.topic, "Rust");
    }

    #[tokio::test]
    async fn create_course_rejects_blank_topic() {
        let usecase = build(
            MockCourseRepository::new(),
            MockUserRepository::new(),
            MockGenerativeModel::new(),
            MockJobRepository::new(),
        );

        let result = usecase
            .create_course(
                OWNER,
                CreateCourseModel {
                    topic: "   ".to_string(),
                    ..create_model()
                },
            )
            .await;

        assert!(matches!(result, Err(UseCaseError::Validation(_))));
    }

    #[tokio::test]
    async fn create_course_without_credits_skips_the_model() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(0, false))));

        let mut model = MockGenerativeModel::new();
        model.expect_generate().never();

        let usecase = build(
            MockCourseRepository::new(),
            user_repo,
            model,
            MockJobRepository::new(),
        );
        let result = usecase.create_course(OWNER, create_model()).await;

        assert!(matches!(
            result,
            Err(UseCaseError::EntitlementExhausted { remaining: 0 })
        ));
    }

    #[tokio::test]
    async fn create_course_losing_the_credit_race_persists_nothing() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(1, false))));
        user_repo
            .expect_consume_credit_if_available()
            .returning(|_| Ok(None));

        let mut course_repo = MockCourseRepository::new();
        course_repo.expect_create_course().never();

        let usecase = build(
            course_repo,
            user_repo,
            model_answering(Ok(LAYOUT_JSON.to_string())),
            MockJobRepository::new(),
        );
        let result = usecase.create_course(OWNER, create_model()).await;

        assert!(matches!(
            result,
            Err(UseCaseError::EntitlementExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_layout_is_fatal_and_spends_nothing() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(3, false))));
        user_repo.expect_consume_credit_if_available().never();

        let usecase = build(
            MockCourseRepository::new(),
            user_repo,
            model_answering(Ok("not json at all".to_string())),
            MockJobRepository::new(),
        );
        let result = usecase.create_course(OWNER, create_model()).await;

        assert!(matches!(result, Err(UseCaseError::FatalGeneration(_))));
    }

    #[tokio::test]
    async fn model_outage_is_an_external_service_error() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(0, true))));

        let usecase = build(
            MockCourseRepository::new(),
            user_repo,
            model_answering(Err(GenerationError::Transient("503".to_string()))),
            MockJobRepository::new(),
        );
        let result = usecase.create_course(OWNER, create_model()).await;

        assert!(matches!(result, Err(UseCaseError::ExternalService(_))));
    }

    #[tokio::test]
    async fn failed_enqueue_marks_course_as_error() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(0, true))));

        let mut course_repo = MockCourseRepository::new();
        course_repo
            .expect_create_course()
            .returning(|course| Ok(stored(course)));
        course_repo
            .expect_update_status_from_generating()
            .withf(|_, status| *status == CourseStatus::Error)
            .times(1)
            .returning(|_, _| Ok(true));

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_enqueue_job()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let usecase = build(
            course_repo,
            user_repo,
            model_answering(Ok(LAYOUT_JSON.to_string())),
            job_repo,
        );
        let result = usecase.create_course(OWNER, create_model()).await;

        assert!(matches!(result, Err(UseCaseError::Internal(_))));
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_forbidden() {
        let mut course_repo = MockCourseRepository::new();
        course_repo
            .expect_find_by_course_id()
            .with(eq("c1"))
            .returning(|_| Ok(Some(sample_course("c1", OWNER))));
        course_repo.expect_delete_course_cascade().never();

        let usecase = build(
            course_repo,
            MockUserRepository::new(),
            MockGenerativeModel::new(),
            MockJobRepository::new(),
        );

        assert!(matches!(
            usecase.delete_course("c1", "intruder@example.com").await,
            Err(UseCaseError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn delete_missing_course_is_not_found() {
        let mut course_repo = MockCourseRepository::new();
        course_repo.expect_find_by_course_id().returning(|_| Ok(None));

        let usecase = build(
            course_repo,
            MockUserRepository::new(),
            MockGenerativeModel::new(),
            MockJobRepository::new(),
        );

        assert!(matches!(
            usecase.delete_course("missing", OWNER).await,
            Err(UseCaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn owner_delete_cascades() {
        let mut course_repo = MockCourseRepository::new();
        course_repo
            .expect_find_by_course_id()
            .returning(|_| Ok(Some(sample_course("c1", OWNER))));
        course_repo
            .expect_delete_course_cascade()
            .with(eq("c1"))
            .times(1)
            .returning(|_| Ok(()));

        let usecase = build(
            course_repo,
            MockUserRepository::new(),
            MockGenerativeModel::new(),
            MockJobRepository::new(),
        );

        usecase.delete_course("c1", OWNER).await.unwrap();
    }

    #[tokio::test]
    async fn set_status_reports_terminal_course() {
        let mut course_repo = MockCourseRepository::new();
        course_repo
            .expect_find_by_course_id()
            .returning(|_| Ok(Some(sample_course("c1", OWNER))));
        course_repo
            .expect_update_status_from_generating()
            .with(eq("c1"), eq(CourseStatus::Error))
            .returning(|_, _| Ok(false));

        let usecase = build(
            course_repo,
            MockUserRepository::new(),
            MockGenerativeModel::new(),
            MockJobRepository::new(),
        );

        assert!(!usecase.set_status("c1", CourseStatus::Error).await.unwrap());
    }
}
