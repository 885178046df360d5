use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use crates::{
    domain::{
        entities::{
            study_materials::InsertCourseEntity,
            study_type_contents::InsertStudyTypeContentEntity,
        },
        repositories::{
            chapter_notes::ChapterNotesRepository, courses::CourseRepository,
            generative_model::GenerativeModel, study_type_contents::StudyTypeContentRepository,
        },
        value_objects::{
            enums::{
                course_statuses::CourseStatus, study_content_statuses::StudyContentStatus,
                study_types::StudyType,
            },
            generation::{GenerationError, ResponseFormat},
            jobs::{
                NOTES_GENERATION_JOB, NotesGenerationPayload, STUDY_CONTENT_JOB,
                StudyContentPayload, notes_job_key, study_content_job_key,
            },
        },
    },
    generation::ContentGenerators,
    infra::memory::MemoryStore,
    workflow::{JobOutcome, JobQueue, RetryPolicy, WorkerSettings, WorkflowRunner},
};
use serde_json::{Value, json};
use worker::usecases::{
    generate_notes::{
        FINALIZE_STATUS_STEP, GENERATE_CHAPTER_NOTES_STEP, NotesGenerationHandler,
        chapter_step_name,
    },
    generate_study_type_content::StudyTypeContentHandler,
};

const MAX_ATTEMPTS: i32 = 3;

/// Answers every prompt, except that prompts containing a scripted marker
/// fail transiently a set number of times first.
#[derive(Default)]
struct ScriptedModel {
    transient_failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    answer: Option<String>,
}

impl ScriptedModel {
    fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            ..Default::default()
        }
    }

    fn failing(marker: &str, times: usize) -> Self {
        let model = Self::default();
        model
            .transient_failures
            .lock()
            .unwrap()
            .insert(marker.to_string(), times);
        model
    }

    fn calls_containing(&self, marker: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|prompt| prompt.contains(marker))
            .count()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(
        &self,
        prompt: &str,
        _format: ResponseFormat,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let mut failures = self.transient_failures.lock().unwrap();
        if let Some(remaining) = failures
            .iter_mut()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, remaining)| remaining)
        {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(GenerationError::Transient("429 too many requests".into()));
            }
        }

        Ok(self
            .answer
            .clone()
            .unwrap_or_else(|| format!("<h3>Notes</h3><p>{}</p>", prompt.len())))
    }
}

fn runner(store: &Arc<MemoryStore>, model: Arc<ScriptedModel>) -> WorkflowRunner {
    let generators = ContentGenerators::uniform(model);

    WorkflowRunner::new(
        store.clone(),
        WorkerSettings {
            worker_id: "test-worker".to_string(),
            concurrency: 1,
            poll_interval: Duration::from_millis(10),
            lease: Duration::from_secs(60),
            retry: RetryPolicy {
                base_delay: Duration::from_secs(30),
                max_delay: Duration::from_secs(60),
            },
        },
    )
    .register(Arc::new(NotesGenerationHandler::new(
        store.clone(),
        store.clone(),
        generators.clone(),
        2,
    )))
    .register(Arc::new(StudyTypeContentHandler::new(store.clone(), generators)))
}

async fn seed_course(store: &MemoryStore, course_id: &str, layout: Option<Value>) {
    store
        .create_course(InsertCourseEntity {
            course_id: course_id.to_string(),
            created_by: "owner@example.com".to_string(),
            topic: "Rust".to_string(),
            difficulty_level: "Easy".to_string(),
            course_type: "Exam".to_string(),
            course_layout: layout,
            status: CourseStatus::Generating.to_string(),
            is_public: false,
        })
        .await
        .unwrap();
}

async fn enqueue_notes(store: &Arc<MemoryStore>, course_id: &str) -> uuid::Uuid {
    JobQueue::new(store.clone(), MAX_ATTEMPTS)
        .enqueue(
            NOTES_GENERATION_JOB,
            notes_job_key(course_id),
            &NotesGenerationPayload {
                course_id: course_id.to_string(),
            },
        )
        .await
        .unwrap()
        .job_id()
}

async fn course_status(store: &MemoryStore, course_id: &str) -> CourseStatus {
    store
        .find_by_course_id(course_id)
        .await
        .unwrap()
        .unwrap()
        .course_status()
}

async fn chapter_ids(store: &MemoryStore, course_id: &str) -> Vec<i32> {
    ChapterNotesRepository::list_by_course(store, course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|notes| notes.chapter_id)
        .collect()
}

fn layout(titles: &[&str]) -> Value {
    json!({
        "courseTitle": "Rust",
        "chapters": titles
            .iter()
            .map(|title| json!({"chapterTitle": title, "topics": ["basics"]}))
            .collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn every_chapter_gets_notes_and_course_becomes_ready() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "course-1", Some(layout(&["One", "Two", "Three", "Four"]))).await;
    let job_id = enqueue_notes(&store, "course-1").await;

    let outcomes = runner(&store, Arc::new(ScriptedModel::default()))
        .drain()
        .await
        .unwrap();

    assert_eq!(outcomes, vec![JobOutcome::Done]);
    assert_eq!(course_status(&store, "course-1").await, CourseStatus::Ready);
    assert_eq!(chapter_ids(&store, "course-1").await, vec![1, 2, 3, 4]);

    let steps = store.step_names(job_id).unwrap();
    assert!(steps.contains(&GENERATE_CHAPTER_NOTES_STEP.to_string()));
    assert!(steps.contains(&FINALIZE_STATUS_STEP.to_string()));
    assert!(steps.contains(&chapter_step_name(4)));
}

#[tokio::test]
async fn transient_chapter_failure_is_retried_without_duplicates() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "course-2", Some(layout(&["Alpha", "Beta", "Gamma"]))).await;
    enqueue_notes(&store, "course-2").await;

    let model = Arc::new(ScriptedModel::failing("Beta", 1));
    let runner = runner(&store, Arc::clone(&model));

    let first = runner.drain().await.unwrap();
    assert!(matches!(first.as_slice(), [JobOutcome::Retrying { .. }]));
    assert_eq!(course_status(&store, "course-2").await, CourseStatus::Generating);
    assert_eq!(chapter_ids(&store, "course-2").await, vec![1, 3]);

    store.make_queued_jobs_due().unwrap();
    let second = runner.drain().await.unwrap();

    assert_eq!(second, vec![JobOutcome::Done]);
    assert_eq!(course_status(&store, "course-2").await, CourseStatus::Ready);
    assert_eq!(chapter_ids(&store, "course-2").await, vec![1, 2, 3]);
    // Memoized chapters are not generated again.
    assert_eq!(model.calls_containing("Alpha"), 1);
    assert_eq!(model.calls_containing("Beta"), 2);
    assert_eq!(model.calls_containing("Gamma"), 1);
}

#[tokio::test]
async fn missing_layout_marks_course_error_without_notes() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "course-3", None).await;
    enqueue_notes(&store, "course-3").await;

    let model = Arc::new(ScriptedModel::default());
    let outcomes = runner(&store, Arc::clone(&model)).drain().await.unwrap();

    assert!(matches!(outcomes.as_slice(), [JobOutcome::Dead { .. }]));
    assert_eq!(course_status(&store, "course-3").await, CourseStatus::Error);
    assert!(chapter_ids(&store, "course-3").await.is_empty());
    assert_eq!(model.calls_containing(""), 0);
}

#[tokio::test]
async fn exhausted_retries_mark_course_error() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "course-4", Some(layout(&["Stable", "Broken"]))).await;
    enqueue_notes(&store, "course-4").await;

    let runner = runner(&store, Arc::new(ScriptedModel::failing("Broken", usize::MAX)));

    let mut outcomes = Vec::new();
    for _ in 0..MAX_ATTEMPTS {
        outcomes.extend(runner.drain().await.unwrap());
        store.make_queued_jobs_due().unwrap();
    }

    assert_eq!(outcomes.len(), MAX_ATTEMPTS as usize);
    assert!(matches!(outcomes.last(), Some(JobOutcome::Dead { .. })));
    assert_eq!(course_status(&store, "course-4").await, CourseStatus::Error);
    assert_eq!(chapter_ids(&store, "course-4").await, vec![1]);
}

#[tokio::test]
async fn two_chapter_course_c1_ends_ready() {
    let store = Arc::new(MemoryStore::new());
    seed_course(
        &store,
        "c1",
        Some(json!({"chapters": [{"title": "Intro"}, {"title": "Basics"}]})),
    )
    .await;
    enqueue_notes(&store, "c1").await;

    runner(&store, Arc::new(ScriptedModel::default()))
        .drain()
        .await
        .unwrap();

    let notes = ChapterNotesRepository::list_by_course(store.as_ref(), "c1")
        .await
        .unwrap();
    assert_eq!(
        notes
            .iter()
            .map(|n| (n.chapter_id, n.course_id.as_str()))
            .collect::<Vec<_>>(),
        vec![(1, "c1"), (2, "c1")]
    );
    assert_eq!(course_status(&store, "c1").await, CourseStatus::Ready);
}

#[tokio::test]
async fn study_type_job_fills_its_placeholder() {
    let store = Arc::new(MemoryStore::new());
    seed_course(&store, "course-5", Some(layout(&["Cells"]))).await;
    let record = store
        .insert_placeholder(InsertStudyTypeContentEntity {
            course_id: "course-5".to_string(),
            study_type: StudyType::Flashcard.to_string(),
            status: StudyContentStatus::Generating.to_string(),
        })
        .await
        .unwrap();

    JobQueue::new(store.clone(), MAX_ATTEMPTS)
        .enqueue(
            STUDY_CONTENT_JOB,
            study_content_job_key(record.id),
            &StudyContentPayload {
                record_id: record.id,
                course_id: "course-5".to_string(),
                study_type: StudyType::Flashcard,
                prompt: "flashcards about cells".to_string(),
            },
        )
        .await
        .unwrap();

    let model = ScriptedModel::answering(
        r#"```json
{"flashcards": [{"front": "Cell", "back": "Basic unit of life"}]}
```"#,
    );
    let outcomes = runner(&store, Arc::new(model)).drain().await.unwrap();

    assert_eq!(outcomes, vec![JobOutcome::Done]);
    let stored = store.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "Ready");
    assert_eq!(
        stored.content,
        Some(json!([{"front": "Cell", "back": "Basic unit of life"}]))
    );
}

#[tokio::test]
async fn study_type_job_without_placeholder_dies() {
    let store = Arc::new(MemoryStore::new());

    JobQueue::new(store.clone(), MAX_ATTEMPTS)
        .enqueue(
            STUDY_CONTENT_JOB,
            study_content_job_key(999),
            &StudyContentPayload {
                record_id: 999,
                course_id: "gone".to_string(),
                study_type: StudyType::Qa,
                prompt: "qa".to_string(),
            },
        )
        .await
        .unwrap();

    let model = Arc::new(ScriptedModel::answering(r#"[{"question": "Q", "answer": "A"}]"#));
    let outcomes = runner(&store, Arc::clone(&model)).drain().await.unwrap();

    assert!(matches!(outcomes.as_slice(), [JobOutcome::Dead { .. }]));
    assert_eq!(model.calls_containing(""), 0);
}
