use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    pg::Pg,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use std::sync::Arc;

use crate::{
    domain::{
        entities::study_materials::CourseEntity,
        repositories::marketplace::MarketplaceRepository,
        value_objects::{
            enums::marketplace_sorts::MarketplaceSort,
            marketplace::{MarketplaceFilter, MarketplaceQuery, SlugAssignment},
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::study_materials},
};

pub struct MarketplacePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MarketplacePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// `%term%` with LIKE wildcards in the user input escaped.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn public_courses(filter: &MarketplaceFilter) -> study_materials::BoxedQuery<'static, Pg> {
    let mut query = study_materials::table
        .filter(study_materials::is_public.eq(true))
        .into_boxed();

    if let Some(search) = filter.search.as_deref() {
        query = query.filter(study_materials::topic.ilike(contains_pattern(search)));
    }
    if let Some(difficulty_level) = filter.difficulty_level.clone() {
        query = query.filter(study_materials::difficulty_level.eq(difficulty_level));
    }
    if let Some(course_type) = filter.course_type.clone() {
        query = query.filter(study_materials::course_type.eq(course_type));
    }

    query
}

#[async_trait]
impl MarketplaceRepository for MarketplacePostgres {
    async fn assign_public_slug(&self, course_id: &str, slug: &str) -> Result<SlugAssignment> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let assigned = diesel::update(
            study_materials::table
                .filter(study_materials::course_id.eq(course_id))
                .filter(
                    study_materials::is_public
                        .eq(false)
                        .or(study_materials::public_slug.is_null()),
                ),
        )
        .set((
            study_materials::is_public.eq(true),
            study_materials::public_slug.eq(Some(slug)),
        ))
        .returning(study_materials::public_slug)
        .get_result::<Option<String>>(&mut conn)
        .optional();

        match assigned {
            Ok(Some(_)) => Ok(SlugAssignment::Assigned(slug.to_string())),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(SlugAssignment::SlugTaken)
            }
            Err(err) => Err(err.into()),
            Ok(None) => {
                let existing = study_materials::table
                    .filter(study_materials::course_id.eq(course_id))
                    .select(study_materials::public_slug)
                    .first::<Option<String>>(&mut conn)
                    .optional()?;

                match existing {
                    None => Ok(SlugAssignment::CourseNotFound),
                    Some(Some(existing_slug)) => Ok(SlugAssignment::AlreadyPublic(existing_slug)),
                    // Became private again between the two statements.
                    Some(None) => Ok(SlugAssignment::SlugTaken),
                }
            }
        }
    }

    async fn clear_public_slug(&self, course_id: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated =
            diesel::update(study_materials::table.filter(study_materials::course_id.eq(course_id)))
                .set((
                    study_materials::is_public.eq(false),
                    study_materials::public_slug.eq::<Option<String>>(None),
                ))
                .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn increment_upvotes(&self, course_id: &str) -> Result<Option<i32>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let upvotes = diesel::update(
            study_materials::table
                .filter(study_materials::course_id.eq(course_id))
                .filter(study_materials::is_public.eq(true)),
        )
        .set(study_materials::upvotes.eq(study_materials::upvotes + 1))
        .returning(study_materials::upvotes)
        .get_result::<i32>(&mut conn)
        .optional()?;

        Ok(upvotes)
    }

    async fn find_public_by_slug(&self, slug: &str) -> Result<Option<CourseEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let course = study_materials::table
            .filter(study_materials::public_slug.eq(slug))
            .filter(study_materials::is_public.eq(true))
            .select(CourseEntity::as_select())
            .first::<CourseEntity>(&mut conn)
            .optional()?;

        Ok(course)
    }

    async fn list_public(&self, query: MarketplaceQuery) -> Result<(Vec<CourseEntity>, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = public_courses(&query.filter)
            .count()
            .get_result::<i64>(&mut conn)?;

        let ordered = match query.sort.effective() {
            MarketplaceSort::Newest => public_courses(&query.filter)
                .order((study_materials::created_at.desc(), study_materials::id.desc())),
            _ => public_courses(&query.filter)
                .order((study_materials::upvotes.desc(), study_materials::id.desc())),
        };

        let courses = ordered
            .select(CourseEntity::as_select())
            .limit(query.limit)
            .offset(query.offset())
            .load::<CourseEntity>(&mut conn)?;

        Ok((courses, total))
    }
}
