use std::sync::Arc;

use async_trait::async_trait;
use crates::{
    domain::{
        entities::chapter_notes::InsertChapterNotesEntity,
        repositories::{chapter_notes::ChapterNotesRepository, courses::CourseRepository},
        value_objects::{
            course_layout::chapters_of,
            enums::course_statuses::CourseStatus,
            jobs::{NOTES_GENERATION_JOB, NotesGenerationPayload},
        },
    },
    generation::{ContentGenerators, prompts},
    workflow::{JobHandler, StepContext, WorkflowError},
};
use futures_util::{StreamExt, stream};
use serde_json::Value;
use tracing::{info, warn};

pub const GENERATE_CHAPTER_NOTES_STEP: &str = "generate-chapter-notes";
pub const FINALIZE_STATUS_STEP: &str = "finalize-status";

pub fn chapter_step_name(chapter_id: i32) -> String {
    format!("{GENERATE_CHAPTER_NOTES_STEP}/chapter-{chapter_id}")
}

/// Generates notes for every chapter of a course, then marks it `Ready`.
/// A job that dies marks the course `Error` instead.
pub struct NotesGenerationHandler {
    course_repository: Arc<dyn CourseRepository + Send + Sync>,
    chapter_notes_repository: Arc<dyn ChapterNotesRepository + Send + Sync>,
    generators: ContentGenerators,
    fanout: usize,
}

impl NotesGenerationHandler {
    pub fn new(
        course_repository: Arc<dyn CourseRepository + Send + Sync>,
        chapter_notes_repository: Arc<dyn ChapterNotesRepository + Send + Sync>,
        generators: ContentGenerators,
        fanout: usize,
    ) -> Self {
        Self {
            course_repository,
            chapter_notes_repository,
            generators,
            fanout: fanout.max(1),
        }
    }

    async fn generate_all_chapters(
        &self,
        ctx: &StepContext,
        course_id: &str,
    ) -> Result<usize, WorkflowError> {
        let course = self
            .course_repository
            .find_by_course_id(course_id)
            .await?
            .ok_or_else(|| WorkflowError::fatal(format!("course {course_id} not found")))?;

        let chapters: Vec<Value> = chapters_of(course.course_layout.as_ref())
            .cloned()
            .ok_or_else(|| {
                WorkflowError::fatal(format!("course {course_id} layout has no chapter list"))
            })?;
        let total = chapters.len();

        // Every chapter runs to completion before the step reports, so the
        // ones that succeeded stay memoized for the retry.
        let results: Vec<Result<i32, WorkflowError>> =
            stream::iter(chapters.into_iter().enumerate())
                .map(|(index, chapter)| {
                    let chapter_id = index as i32 + 1;
                    async move {
                        let step_name = chapter_step_name(chapter_id);
                        ctx.run(
                            &step_name,
                            self.generate_chapter(course_id, chapter_id, &chapter),
                        )
                        .await
                    }
                })
                .buffer_unordered(self.fanout)
                .collect()
                .await;

        let failures: Vec<WorkflowError> = results.into_iter().filter_map(Result::err).collect();
        if let Some(first) = failures.first() {
            warn!(
                course_id,
                failed = failures.len(),
                total,
                error = %first,
                "notes: chapter generation failed"
            );
            // A fatal chapter would fail the same way on retry.
            let reported = failures
                .iter()
                .find(|err| !err.is_retryable())
                .unwrap_or(first);
            return Err(reported.clone());
        }

        info!(course_id, chapters = total, "notes: all chapters generated");
        Ok(total)
    }

    async fn generate_chapter(
        &self,
        course_id: &str,
        chapter_id: i32,
        chapter: &Value,
    ) -> Result<i32, WorkflowError> {
        let prompt = prompts::chapter_notes_prompt(chapter);
        let notes = self.generators.generate_notes(&prompt).await?;

        self.chapter_notes_repository
            .upsert_chapter_notes(InsertChapterNotesEntity {
                course_id: course_id.to_string(),
                chapter_id,
                notes,
            })
            .await?;

        Ok(chapter_id)
    }
}

#[async_trait]
impl JobHandler for NotesGenerationHandler {
    fn job_type(&self) -> &'static str {
        NOTES_GENERATION_JOB
    }

    async fn run(&self, ctx: &StepContext, payload: Value) -> Result<(), WorkflowError> {
        let payload: NotesGenerationPayload =
            serde_json::from_value(payload).map_err(WorkflowError::fatal)?;
        let course_id = payload.course_id.as_str();

        ctx.run(
            GENERATE_CHAPTER_NOTES_STEP,
            self.generate_all_chapters(ctx, course_id),
        )
        .await?;

        ctx.run(FINALIZE_STATUS_STEP, async {
            let updated = self
                .course_repository
                .update_status_from_generating(course_id, CourseStatus::Ready)
                .await?;
            if !updated {
                warn!(course_id, "notes: course was no longer generating");
            }
            Ok::<bool, WorkflowError>(updated)
        })
        .await?;

        info!(course_id, job_id = %ctx.job_id(), "notes: course ready");
        Ok(())
    }

    async fn on_failure(&self, payload: &Value, error: &WorkflowError) -> anyhow::Result<()> {
        let payload: NotesGenerationPayload = serde_json::from_value(payload.clone())?;

        self.course_repository
            .update_status_from_generating(&payload.course_id, CourseStatus::Error)
            .await?;
        warn!(course_id = %payload.course_id, error = %error, "notes: course marked as error");

        Ok(())
    }
}
