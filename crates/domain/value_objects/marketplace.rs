use serde::Serialize;

use crate::domain::{
    entities::study_materials::CourseEntity,
    value_objects::{
        courses::{ChapterNotesDto, StudyTypeContentDto},
        enums::marketplace_sorts::MarketplaceSort,
    },
};

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 50;
/// Far past any real listing; keeps the offset well inside `i64`.
pub const MAX_PAGE: i64 = 100_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketplaceFilter {
    pub search: Option<String>,
    pub difficulty_level: Option<String>,
    pub course_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceQuery {
    pub filter: MarketplaceFilter,
    pub sort: MarketplaceSort,
    /// 1-based.
    pub page: i64,
    pub limit: i64,
}

impl MarketplaceQuery {
    /// Clamps page and limit into the supported range and drops blank filters.
    pub fn new(
        filter: MarketplaceFilter,
        sort: MarketplaceSort,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            filter: MarketplaceFilter {
                search: non_blank(filter.search),
                difficulty_level: non_blank(filter.difficulty_level),
                course_type: non_blank(filter.course_type),
            },
            sort,
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Result of trying to make a course public with a candidate slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugAssignment {
    Assigned(String),
    /// The course was already public; its existing slug is kept.
    AlreadyPublic(String),
    /// Unique constraint on `public_slug` rejected the candidate.
    SlugTaken,
    CourseNotFound,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicCourseDto {
    pub id: i32,
    pub course_id: String,
    pub topic: String,
    pub difficulty_level: String,
    pub course_type: String,
    pub created_by: String,
    pub upvotes: i32,
    pub public_slug: Option<String>,
}

impl From<CourseEntity> for PublicCourseDto {
    fn from(entity: CourseEntity) -> Self {
        Self {
            id: entity.id,
            course_id: entity.course_id,
            topic: entity.topic,
            difficulty_level: entity.difficulty_level,
            course_type: entity.course_type,
            created_by: entity.created_by,
            upvotes: entity.upvotes,
            public_slug: entity.public_slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketplacePage {
    pub materials: Vec<PublicCourseDto>,
    pub pagination: Pagination,
}

impl MarketplacePage {
    pub fn new(items: Vec<CourseEntity>, total: i64, query: &MarketplaceQuery) -> Self {
        Self {
            materials: items.into_iter().map(PublicCourseDto::from).collect(),
            pagination: Pagination {
                total,
                total_pages: (total + query.limit - 1) / query.limit,
                current_page: query.page,
                limit: query.limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicCourseDetailDto {
    pub material: PublicCourseDto,
    pub course_layout: Option<serde_json::Value>,
    pub chapter_notes: Vec<ChapterNotesDto>,
    pub study_type_content: Vec<StudyTypeContentDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_clamps_page_and_limit() {
        let query = MarketplaceQuery::new(
            MarketplaceFilter {
                search: Some("   ".into()),
                ..Default::default()
            },
            MarketplaceSort::Upvotes,
            Some(0),
            Some(500),
        );

        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_LIMIT);
        assert_eq!(query.filter.search, None);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn offset_follows_page() {
        let query = MarketplaceQuery::new(
            MarketplaceFilter::default(),
            MarketplaceSort::Newest,
            Some(3),
            Some(10),
        );
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn huge_page_is_capped_without_overflow() {
        let query = MarketplaceQuery::new(
            MarketplaceFilter::default(),
            MarketplaceSort::Upvotes,
            Some(i64::MAX),
            Some(MAX_PAGE_LIMIT),
        );

        assert_eq!(query.page, MAX_PAGE);
        assert_eq!(query.offset(), (MAX_PAGE - 1) * MAX_PAGE_LIMIT);
    }
}
