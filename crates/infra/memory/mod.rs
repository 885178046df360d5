//! Process-local implementation of every repository trait.
//!
//! Used by integration tests and local runs without Postgres. Each operation
//! takes the single state lock, which gives the same atomicity the Postgres
//! repositories get from conditional updates.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    entities::{
        chapter_notes::{ChapterNotesEntity, InsertChapterNotesEntity},
        jobs::{InsertJobEntity, JobEntity},
        payment_records::{InsertPaymentRecordEntity, PaymentRecordEntity},
        study_materials::{CourseEntity, InsertCourseEntity},
        study_type_contents::{InsertStudyTypeContentEntity, StudyTypeContentEntity},
        users::{InsertUserEntity, UserEntity},
        youtube_recommendations::YoutubeRecommendationEntity,
    },
    repositories::{
        chapter_notes::ChapterNotesRepository, courses::CourseRepository, job::JobRepository,
        marketplace::MarketplaceRepository, payment_records::PaymentRecordRepository,
        study_type_contents::StudyTypeContentRepository, users::UserRepository,
    },
    value_objects::{
        enums::{
            course_statuses::CourseStatus, job_statuses::JobStatus,
            marketplace_sorts::MarketplaceSort, study_content_statuses::StudyContentStatus,
            study_types::StudyType,
        },
        jobs::EnqueueOutcome,
        marketplace::{MarketplaceQuery, SlugAssignment},
    },
};

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: Vec<UserEntity>,
    courses: Vec<CourseEntity>,
    chapter_notes: Vec<ChapterNotesEntity>,
    study_type_contents: Vec<StudyTypeContentEntity>,
    youtube_recommendations: Vec<YoutubeRecommendationEntity>,
    payment_records: Vec<PaymentRecordEntity>,
    jobs: Vec<JobEntity>,
    job_steps: Vec<(Uuid, String, Value)>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store: state lock poisoned"))
    }

    pub fn add_youtube_recommendation(
        &self,
        course_id: &str,
        title: &str,
        video_id: &str,
    ) -> Result<()> {
        let mut state = self.lock()?;
        let id = state.next_id();
        state.youtube_recommendations.push(YoutubeRecommendationEntity {
            id,
            course_id: course_id.to_string(),
            title: title.to_string(),
            video_id: video_id.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    pub fn jobs(&self) -> Result<Vec<JobEntity>> {
        Ok(self.lock()?.jobs.clone())
    }

    pub fn payment_records(&self) -> Result<Vec<PaymentRecordEntity>> {
        Ok(self.lock()?.payment_records.clone())
    }

    pub fn step_names(&self, job_id: Uuid) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .job_steps
            .iter()
            .filter(|(id, _, _)| *id == job_id)
            .map(|(_, name, _)| name.clone())
            .collect())
    }

    /// Pulls every queued job's `run_at` to now so retries run without waiting out backoff.
    pub fn make_queued_jobs_due(&self) -> Result<()> {
        let now = Utc::now();
        let mut state = self.lock()?;
        state
            .jobs
            .iter_mut()
            .filter(|job| job.job_status() == JobStatus::Queued)
            .for_each(|job| job.run_at = now);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert_user(&self, user: InsertUserEntity) -> Result<UserEntity> {
        let mut state = self.lock()?;

        if let Some(existing) = state.users.iter().find(|u| u.email == user.email) {
            return Ok(existing.clone());
        }

        let id = state.next_id();
        let created = UserEntity {
            id,
            email: user.email,
            user_name: user.user_name,
            credits: user.credits,
            is_member: user.is_member,
            customer_id: None,
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn consume_credit_if_available(&self, email: &str) -> Result<Option<i32>> {
        let mut state = self.lock()?;
        let remaining = state
            .users
            .iter_mut()
            .find(|u| u.email == email && u.credits > 0)
            .map(|user| {
                user.credits -= 1;
                user.credits
            });
        Ok(remaining)
    }

    async fn activate_membership_by_email(
        &self,
        email: &str,
        customer_id: Option<String>,
    ) -> Result<usize> {
        let mut state = self.lock()?;
        let mut updated = 0;
        for user in state.users.iter_mut().filter(|u| u.email == email) {
            user.is_member = true;
            if let Some(customer_id) = customer_id.as_ref() {
                user.customer_id = Some(customer_id.clone());
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn set_membership_by_customer_id(
        &self,
        customer_id: &str,
        is_member: bool,
    ) -> Result<usize> {
        let mut state = self.lock()?;
        let mut updated = 0;
        for user in state
            .users
            .iter_mut()
            .filter(|u| u.customer_id.as_deref() == Some(customer_id))
        {
            user.is_member = is_member;
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn create_course(&self, course: InsertCourseEntity) -> Result<CourseEntity> {
        let mut state = self.lock()?;

        if state.courses.iter().any(|c| c.course_id == course.course_id) {
            return Err(anyhow!("course {} already exists", course.course_id));
        }

        let id = state.next_id();
        let created = CourseEntity {
            id,
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
        };
        state.courses.push(created.clone());
        Ok(created)
    }

    async fn find_by_course_id(&self, course_id: &str) -> Result<Option<CourseEntity>> {
        Ok(self
            .lock()?
            .courses
            .iter()
            .find(|c| c.course_id == course_id)
            .cloned())
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<CourseEntity>> {
        let mut courses: Vec<CourseEntity> = self
            .lock()?
            .courses
            .iter()
            .filter(|c| c.created_by == email)
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(courses)
    }

    async fn update_status_from_generating(
        &self,
        course_id: &str,
        status: CourseStatus,
    ) -> Result<bool> {
        let mut state = self.lock()?;
        let course = state.courses.iter_mut().find(|c| {
            c.course_id == course_id && c.course_status() == CourseStatus::Generating
        });
        match course {
            Some(course) => {
                course.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_course_cascade(&self, course_id: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.chapter_notes.retain(|n| n.course_id != course_id);
        state.study_type_contents.retain(|s| s.course_id != course_id);
        state.youtube_recommendations.retain(|y| y.course_id != course_id);
        state.courses.retain(|c| c.course_id != course_id);
        Ok(())
    }

    async fn list_youtube_recommendations(
        &self,
        course_id: &str,
    ) -> Result<Vec<YoutubeRecommendationEntity>> {
        Ok(self
            .lock()?
            .youtube_recommendations
            .iter()
            .filter(|y| y.course_id == course_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChapterNotesRepository for MemoryStore {
    async fn upsert_chapter_notes(&self, notes: InsertChapterNotesEntity) -> Result<()> {
        let mut state = self.lock()?;

        if let Some(existing) = state
            .chapter_notes
            .iter_mut()
            .find(|n| n.course_id == notes.course_id && n.chapter_id == notes.chapter_id)
        {
            existing.notes = notes.notes;
            return Ok(());
        }

        let id = state.next_id();
        state.chapter_notes.push(ChapterNotesEntity {
            id,
            course_id: notes.course_id,
            chapter_id: notes.chapter_id,
            notes: notes.notes,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_by_course(&self, course_id: &str) -> Result<Vec<ChapterNotesEntity>> {
        let mut notes: Vec<ChapterNotesEntity> = self
            .lock()?
            .chapter_notes
            .iter()
            .filter(|n| n.course_id == course_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.chapter_id);
        Ok(notes)
    }
}

#[async_trait]
impl StudyTypeContentRepository for MemoryStore {
    async fn insert_placeholder(
        &self,
        record: InsertStudyTypeContentEntity,
    ) -> Result<StudyTypeContentEntity> {
        let mut state = self.lock()?;
        let id = state.next_id();
        let created = StudyTypeContentEntity {
            id,
            course_id: record.course_id,
            study_type: record.study_type,
            content: None,
            status: record.status,
            created_at: Utc::now(),
        };
        state.study_type_contents.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, record_id: i32) -> Result<Option<StudyTypeContentEntity>> {
        Ok(self
            .lock()?
            .study_type_contents
            .iter()
            .find(|s| s.id == record_id)
            .cloned())
    }

    async fn delete_placeholder(&self, record_id: i32) -> Result<()> {
        let generating = StudyContentStatus::Generating.to_string();
        self.lock()?
            .study_type_contents
            .retain(|s| !(s.id == record_id && s.status == generating));
        Ok(())
    }

    async fn mark_ready(&self, record_id: i32, content: Value) -> Result<bool> {
        let mut state = self.lock()?;
        match state.study_type_contents.iter_mut().find(|s| s.id == record_id) {
            Some(record) => {
                record.content = Some(content);
                record.status = StudyContentStatus::Ready.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_course(
        &self,
        course_id: &str,
        study_type: Option<StudyType>,
    ) -> Result<Vec<StudyTypeContentEntity>> {
        let study_type = study_type.map(|t| t.to_string());
        Ok(self
            .lock()?
            .study_type_contents
            .iter()
            .filter(|s| s.course_id == course_id)
            .filter(|s| study_type.as_ref().is_none_or(|t| &s.study_type == t))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MarketplaceRepository for MemoryStore {
    async fn assign_public_slug(&self, course_id: &str, slug: &str) -> Result<SlugAssignment> {
        let mut state = self.lock()?;

        let Some(index) = state.courses.iter().position(|c| c.course_id == course_id) else {
            return Ok(SlugAssignment::CourseNotFound);
        };

        if let (true, Some(existing)) = (
            state.courses[index].is_public,
            state.courses[index].public_slug.clone(),
        ) {
            return Ok(SlugAssignment::AlreadyPublic(existing));
        }

        if state
            .courses
            .iter()
            .any(|c| c.public_slug.as_deref() == Some(slug))
        {
            return Ok(SlugAssignment::SlugTaken);
        }

        let course = &mut state.courses[index];
        course.is_public = true;
        course.public_slug = Some(slug.to_string());
        Ok(SlugAssignment::Assigned(slug.to_string()))
    }

    async fn clear_public_slug(&self, course_id: &str) -> Result<bool> {
        let mut state = self.lock()?;
        match state.courses.iter_mut().find(|c| c.course_id == course_id) {
            Some(course) => {
                course.is_public = false;
                course.public_slug = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_upvotes(&self, course_id: &str) -> Result<Option<i32>> {
        let mut state = self.lock()?;
        let upvotes = state
            .courses
            .iter_mut()
            .find(|c| c.course_id == course_id && c.is_public)
            .map(|course| {
                course.upvotes += 1;
                course.upvotes
            });
        Ok(upvotes)
    }

    async fn find_public_by_slug(&self, slug: &str) -> Result<Option<CourseEntity>> {
        Ok(self
            .lock()?
            .courses
            .iter()
            .find(|c| c.is_public && c.public_slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn list_public(&self, query: MarketplaceQuery) -> Result<(Vec<CourseEntity>, i64)> {
        let search = query.filter.search.as_ref().map(|s| s.to_lowercase());

        let mut matching: Vec<CourseEntity> = self
            .lock()?
            .courses
            .iter()
            .filter(|c| c.is_public)
            .filter(|c| {
                search
                    .as_ref()
                    .is_none_or(|s| c.topic.to_lowercase().contains(s.as_str()))
            })
            .filter(|c| {
                query
                    .filter
                    .difficulty_level
                    .as_ref()
                    .is_none_or(|d| &c.difficulty_level == d)
            })
            .filter(|c| {
                query
                    .filter
                    .course_type
                    .as_ref()
                    .is_none_or(|t| &c.course_type == t)
            })
            .cloned()
            .collect();

        match query.sort.effective() {
            MarketplaceSort::Newest => {
                matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
            _ => matching.sort_by(|a, b| b.upvotes.cmp(&a.upvotes).then(b.id.cmp(&a.id))),
        }

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Ok((page, total))
    }
}

#[async_trait]
impl PaymentRecordRepository for MemoryStore {
    async fn record_payment(&self, record: InsertPaymentRecordEntity) -> Result<bool> {
        let mut state = self.lock()?;

        if state
            .payment_records
            .iter()
            .any(|p| p.event_id == record.event_id)
        {
            return Ok(false);
        }

        let id = state.next_id();
        state.payment_records.push(PaymentRecordEntity {
            id,
            event_id: record.event_id,
            customer_id: record.customer_id,
            session_id: record.session_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }
}

/// The job, if it is running under `worker_id`.
fn held_job<'a>(
    jobs: &'a mut [JobEntity],
    job_id: Uuid,
    worker_id: &str,
) -> Option<&'a mut JobEntity> {
    jobs.iter_mut().find(|j| {
        j.id == job_id
            && j.job_status() == JobStatus::Running
            && j.locked_by.as_deref() == Some(worker_id)
    })
}

fn release_lock(job: &mut JobEntity) {
    job.locked_at = None;
    job.locked_by = None;
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn enqueue_job(&self, job: InsertJobEntity) -> Result<EnqueueOutcome> {
        let mut state = self.lock()?;

        if let Some(active) = state
            .jobs
            .iter()
            .find(|j| j.idempotency_key == job.idempotency_key && j.job_status().is_active())
        {
            return Ok(EnqueueOutcome::AlreadyActive(active.id));
        }

        state.jobs.push(JobEntity {
            id: job.id,
            job_type: job.job_type,
            idempotency_key: job.idempotency_key,
            payload: job.payload,
            status: job.status,
            attempts: job.attempts,
            max_attempts: job.max_attempts,
            run_at: job.run_at,
            locked_at: None,
            locked_by: None,
            error: None,
            created_at: Utc::now(),
        });
        Ok(EnqueueOutcome::Enqueued(job.id))
    }

    async fn lock_next_job(&self, worker_id: &str) -> Result<Option<JobEntity>> {
        let now = Utc::now();
        let mut state = self.lock()?;

        let candidate = state
            .jobs
            .iter_mut()
            .filter(|j| j.job_status() == JobStatus::Queued && j.run_at <= now)
            .min_by_key(|j| j.run_at);

        Ok(candidate.map(|job| {
            job.status = JobStatus::Running.to_string();
            job.locked_at = Some(now);
            job.locked_by = Some(worker_id.to_string());
            job.clone()
        }))
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobEntity>> {
        Ok(self.lock()?.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn find_step_output(&self, job_id: Uuid, step_name: &str) -> Result<Option<Value>> {
        Ok(self
            .lock()?
            .job_steps
            .iter()
            .find(|(id, name, _)| *id == job_id && name == step_name)
            .map(|(_, _, output)| output.clone()))
    }

    async fn save_step_output(&self, job_id: Uuid, step_name: &str, output: Value) -> Result<()> {
        let mut state = self.lock()?;
        if !state
            .job_steps
            .iter()
            .any(|(id, name, _)| *id == job_id && name == step_name)
        {
            state
                .job_steps
                .push((job_id, step_name.to_string(), output));
        }
        Ok(())
    }

    async fn touch_job(&self, job_id: Uuid, worker_id: &str) -> Result<bool> {
        let mut state = self.lock()?;
        Ok(match held_job(&mut state.jobs, job_id, worker_id) {
            Some(job) => {
                job.locked_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }

    async fn mark_job_done(&self, job_id: Uuid, worker_id: &str) -> Result<bool> {
        let mut state = self.lock()?;
        Ok(match held_job(&mut state.jobs, job_id, worker_id) {
            Some(job) => {
                job.status = JobStatus::Done.to_string();
                job.error = None;
                release_lock(job);
                true
            }
            None => false,
        })
    }

    async fn schedule_retry(
        &self,
        job_id: Uuid,
        worker_id: &str,
        err: &str,
        run_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.lock()?;
        Ok(match held_job(&mut state.jobs, job_id, worker_id) {
            Some(job) => {
                job.status = JobStatus::Queued.to_string();
                job.attempts += 1;
                job.error = Some(err.to_string());
                job.run_at = run_at;
                release_lock(job);
                true
            }
            None => false,
        })
    }

    async fn mark_job_dead(&self, job_id: Uuid, worker_id: &str, err: &str) -> Result<bool> {
        let mut state = self.lock()?;
        Ok(match held_job(&mut state.jobs, job_id, worker_id) {
            Some(job) => {
                job.status = JobStatus::Dead.to_string();
                job.attempts += 1;
                job.error = Some(err.to_string());
                release_lock(job);
                true
            }
            None => false,
        })
    }

    async fn reclaim_stale_jobs(&self, locked_before: DateTime<Utc>) -> Result<usize> {
        let mut state = self.lock()?;
        let mut reclaimed = 0;
        for job in state.jobs.iter_mut().filter(|j| {
            j.job_status() == JobStatus::Running
                && j.locked_at.is_some_and(|locked_at| locked_at < locked_before)
        }) {
            job.status = JobStatus::Queued.to_string();
            release_lock(job);
            reclaimed += 1;
        }
        Ok(reclaimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::marketplace::MarketplaceFilter;

    fn user(email: &str, credits: i32) -> InsertUserEntity {
        InsertUserEntity {
            email: email.to_string(),
            user_name: "Learner".to_string(),
            credits,
            is_member: false,
        }
    }

    fn course(course_id: &str, topic: &str) -> InsertCourseEntity {
        InsertCourseEntity {
            course_id: course_id.to_string(),
            created_by: "owner@example.com".to_string(),
            topic: topic.to_string(),
            difficulty_level: "Easy".to_string(),
            course_type: "Exam".to_string(),
            course_layout: None,
            status: CourseStatus::Ready.to_string(),
            is_public: false,
        }
    }

    #[tokio::test]
    async fn upsert_user_keeps_existing_row() {
        let store = MemoryStore::new();
        store.upsert_user(user("a@example.com", 5)).await.unwrap();
        let again = store.upsert_user(user("a@example.com", 99)).await.unwrap();

        assert_eq!(again.credits, 5);
    }

    #[tokio::test]
    async fn consume_credit_stops_at_zero() {
        let store = MemoryStore::new();
        store.upsert_user(user("a@example.com", 1)).await.unwrap();

        assert_eq!(
            store.consume_credit_if_available("a@example.com").await.unwrap(),
            Some(0)
        );
        assert_eq!(
            store.consume_credit_if_available("a@example.com").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn status_only_leaves_generating() {
        let store = MemoryStore::new();
        let mut generating = course("c1", "Rust");
        generating.status = CourseStatus::Generating.to_string();
        store.create_course(generating).await.unwrap();

        assert!(
            store
                .update_status_from_generating("c1", CourseStatus::Ready)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_status_from_generating("c1", CourseStatus::Error)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn second_active_job_with_same_key_is_rejected() {
        let store = MemoryStore::new();
        let job = |id| InsertJobEntity {
            id,
            job_type: "notes.generate".to_string(),
            idempotency_key: "notes:c1".to_string(),
            payload: serde_json::json!({}),
            status: JobStatus::Queued.to_string(),
            attempts: 0,
            max_attempts: 3,
            run_at: Utc::now(),
        };
        let first = Uuid::new_v4();

        assert_eq!(
            store.enqueue_job(job(first)).await.unwrap(),
            EnqueueOutcome::Enqueued(first)
        );
        assert_eq!(
            store.enqueue_job(job(Uuid::new_v4())).await.unwrap(),
            EnqueueOutcome::AlreadyActive(first)
        );

        store.lock_next_job("worker-1").await.unwrap().unwrap();
        assert!(!store.mark_job_done(first, "worker-2").await.unwrap());
        assert!(store.mark_job_done(first, "worker-1").await.unwrap());
        let third = Uuid::new_v4();
        assert_eq!(
            store.enqueue_job(job(third)).await.unwrap(),
            EnqueueOutcome::Enqueued(third)
        );
    }

    #[tokio::test]
    async fn list_public_filters_by_topic_case_insensitively() {
        let store = MemoryStore::new();
        store.create_course(course("c1", "Rust Ownership")).await.unwrap();
        store.create_course(course("c2", "Python Basics")).await.unwrap();
        store.assign_public_slug("c1", "slug-one").await.unwrap();
        store.assign_public_slug("c2", "slug-two").await.unwrap();

        let query = MarketplaceQuery::new(
            MarketplaceFilter {
                search: Some("rust".to_string()),
                ..Default::default()
            },
            MarketplaceSort::Upvotes,
            None,
            None,
        );
        let (items, total) = store.list_public(query).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(items[0].course_id, "c1");
    }

    #[tokio::test]
    async fn slug_collision_is_reported() {
        let store = MemoryStore::new();
        store.create_course(course("c1", "A")).await.unwrap();
        store.create_course(course("c2", "B")).await.unwrap();
        store.assign_public_slug("c1", "same").await.unwrap();

        assert_eq!(
            store.assign_public_slug("c2", "same").await.unwrap(),
            SlugAssignment::SlugTaken
        );
        assert_eq!(
            store.assign_public_slug("c1", "other").await.unwrap(),
            SlugAssignment::AlreadyPublic("same".to_string())
        );
    }
}
