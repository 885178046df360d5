use std::sync::Arc;

use async_trait::async_trait;
use crates::{
    domain::{
        repositories::study_type_contents::StudyTypeContentRepository,
        value_objects::{
            enums::study_content_statuses::StudyContentStatus,
            jobs::{STUDY_CONTENT_JOB, StudyContentPayload},
        },
    },
    generation::ContentGenerators,
    workflow::{JobHandler, StepContext, WorkflowError},
};
use serde_json::Value;
use tracing::{info, warn};

pub const GENERATE_CONTENT_STEP: &str = "generate-content";
pub const SAVE_CONTENT_STEP: &str = "save-content";

/// Fills a `Generating` study-type placeholder with parsed content.
pub struct StudyTypeContentHandler {
    study_type_content_repository: Arc<dyn StudyTypeContentRepository + Send + Sync>,
    generators: ContentGenerators,
}

impl StudyTypeContentHandler {
    pub fn new(
        study_type_content_repository: Arc<dyn StudyTypeContentRepository + Send + Sync>,
        generators: ContentGenerators,
    ) -> Self {
        Self {
            study_type_content_repository,
            generators,
        }
    }
}

#[async_trait]
impl JobHandler for StudyTypeContentHandler {
    fn job_type(&self) -> &'static str {
        STUDY_CONTENT_JOB
    }

    async fn run(&self, ctx: &StepContext, payload: Value) -> Result<(), WorkflowError> {
        let payload: StudyContentPayload =
            serde_json::from_value(payload).map_err(WorkflowError::fatal)?;

        let record = self
            .study_type_content_repository
            .find_by_id(payload.record_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::fatal(format!(
                    "study-type record {} no longer exists",
                    payload.record_id
                ))
            })?;
        if record.status == StudyContentStatus::Ready.to_string() {
            info!(record_id = record.id, "study_content: already ready, nothing to do");
            return Ok(());
        }

        let content: Value = ctx
            .run(GENERATE_CONTENT_STEP, async {
                let content = self
                    .generators
                    .generate_study_content(payload.study_type, &payload.prompt)
                    .await?;
                content.to_value().map_err(WorkflowError::fatal)
            })
            .await?;

        ctx.run(SAVE_CONTENT_STEP, async {
            let saved = self
                .study_type_content_repository
                .mark_ready(payload.record_id, content)
                .await?;
            if !saved {
                return Err(WorkflowError::fatal(format!(
                    "study-type record {} no longer exists",
                    payload.record_id
                )));
            }
            Ok(payload.record_id)
        })
        .await?;

        info!(
            record_id = payload.record_id,
            course_id = %payload.course_id,
            study_type = %payload.study_type,
            "study_content: content ready"
        );
        Ok(())
    }

    async fn on_failure(&self, payload: &Value, error: &WorkflowError) -> anyhow::Result<()> {
        warn!(payload = %payload, error = %error, "study_content: generation abandoned");
        Ok(())
    }
}
