use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    entities::{
        chapter_notes::ChapterNotesEntity, study_materials::CourseEntity,
        study_type_contents::StudyTypeContentEntity,
        youtube_recommendations::YoutubeRecommendationEntity,
    },
    value_objects::enums::{
        course_statuses::CourseStatus, study_content_statuses::StudyContentStatus,
    },
};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseModel {
    pub topic: String,
    #[serde(alias = "difficulty_level", alias = "difficulty")]
    pub difficulty_level: String,
    #[serde(alias = "course_type")]
    pub course_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: i32,
    pub course_id: String,
    pub created_by: String,
    pub topic: String,
    pub difficulty_level: String,
    pub course_type: String,
    pub course_layout: Option<Value>,
    pub status: CourseStatus,
    pub is_public: bool,
    pub public_slug: Option<String>,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CourseEntity> for CourseDto {
    fn from(entity: CourseEntity) -> Self {
        Self {
            status: entity.course_status(),
            id: entity.id,
            course_id: entity.course_id,
            created_by: entity.created_by,
            topic: entity.topic,
            difficulty_level: entity.difficulty_level,
            course_type: entity.course_type,
            course_layout: entity.course_layout,
            is_public: entity.is_public,
            public_slug: entity.public_slug,
            upvotes: entity.upvotes,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterNotesDto {
    pub chapter_id: i32,
    pub notes: String,
}

impl From<ChapterNotesEntity> for ChapterNotesDto {
    fn from(entity: ChapterNotesEntity) -> Self {
        Self {
            chapter_id: entity.chapter_id,
            notes: entity.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyTypeContentDto {
    pub id: i32,
    pub course_id: String,
    pub study_type: String,
    pub content: Option<Value>,
    pub status: StudyContentStatus,
}

impl From<StudyTypeContentEntity> for StudyTypeContentDto {
    fn from(entity: StudyTypeContentEntity) -> Self {
        Self {
            status: StudyContentStatus::from_str(&entity.status),
            id: entity.id,
            course_id: entity.course_id,
            study_type: entity.study_type,
            content: entity.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeRecommendationDto {
    pub title: String,
    pub video_id: String,
}

impl From<YoutubeRecommendationEntity> for YoutubeRecommendationDto {
    fn from(entity: YoutubeRecommendationEntity) -> Self {
        Self {
            title: entity.title,
            video_id: entity.video_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailDto {
    pub course: CourseDto,
    pub chapter_notes: Vec<ChapterNotesDto>,
    pub study_type_contents: Vec<StudyTypeContentDto>,
    pub youtube_recommendations: Vec<YoutubeRecommendationDto>,
}
