use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::study_types::StudyType;

pub const NOTES_GENERATION_JOB: &str = "notes.generate";
pub const STUDY_CONTENT_JOB: &str = "study_type.content";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotesGenerationPayload {
    pub course_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyContentPayload {
    pub record_id: i32,
    pub course_id: String,
    pub study_type: StudyType,
    pub prompt: String,
}

pub fn notes_job_key(course_id: &str) -> String {
    format!("notes:{course_id}")
}

pub fn study_content_job_key(record_id: i32) -> String {
    format!("study_type:{record_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued(Uuid),
    /// A queued or running job already holds the idempotency key.
    AlreadyActive(Uuid),
}

impl EnqueueOutcome {
    pub fn job_id(&self) -> Uuid {
        match self {
            EnqueueOutcome::Enqueued(id) | EnqueueOutcome::AlreadyActive(id) => *id,
        }
    }
}
