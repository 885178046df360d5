use crate::{
    auth::AuthUser,
    usecases::{errors::UseCaseError, marketplace::MarketplaceUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use crates::domain::{
    repositories::{
        chapter_notes::ChapterNotesRepository, courses::CourseRepository,
        marketplace::MarketplaceRepository, study_type_contents::StudyTypeContentRepository,
    },
    value_objects::{
        enums::marketplace_sorts::MarketplaceSort,
        marketplace::{MarketplaceFilter, MarketplaceQuery},
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceParams {
    pub search: Option<String>,
    #[serde(alias = "difficulty", alias = "difficulty_level")]
    pub difficulty_level: Option<String>,
    #[serde(alias = "course_type")]
    pub course_type: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<MarketplaceParams> for MarketplaceQuery {
    fn from(params: MarketplaceParams) -> Self {
        MarketplaceQuery::new(
            MarketplaceFilter {
                search: params.search,
                difficulty_level: params.difficulty_level,
                course_type: params.course_type,
            },
            MarketplaceSort::from_query(params.sort.as_deref()),
            params.page,
            params.limit,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    #[serde(alias = "course_id")]
    pub course_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub public_slug: String,
}

#[derive(Debug, Serialize)]
pub struct UpvoteResponse {
    pub upvotes: i32,
}

pub fn routes<C, M, N, S>(marketplace_usecase: Arc<MarketplaceUseCase<C, M, N, S>>) -> Router
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_public_courses::<C, M, N, S>))
        .route("/:slug", get(get_public_course::<C, M, N, S>))
        .route("/publish", post(publish_course::<C, M, N, S>))
        .route("/unpublish", post(unpublish_course::<C, M, N, S>))
        .route("/upvote", post(upvote_course::<C, M, N, S>))
        .with_state(marketplace_usecase)
}

pub async fn list_public_courses<C, M, N, S>(
    State(marketplace_usecase): State<Arc<MarketplaceUseCase<C, M, N, S>>>,
    Query(params): Query<MarketplaceParams>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    let page = marketplace_usecase.list(params.into()).await?;
    Ok(Json(page))
}

pub async fn get_public_course<C, M, N, S>(
    State(marketplace_usecase): State<Arc<MarketplaceUseCase<C, M, N, S>>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    let detail = marketplace_usecase.get_public(&slug).await?;
    Ok(Json(detail))
}

pub async fn publish_course<C, M, N, S>(
    State(marketplace_usecase): State<Arc<MarketplaceUseCase<C, M, N, S>>>,
    auth: AuthUser,
    Json(course): Json<CourseRef>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    let public_slug = marketplace_usecase
        .publish(&course.course_id, &auth.email)
        .await?;
    Ok(Json(PublishResponse { public_slug }))
}

pub async fn unpublish_course<C, M, N, S>(
    State(marketplace_usecase): State<Arc<MarketplaceUseCase<C, M, N, S>>>,
    auth: AuthUser,
    Json(course): Json<CourseRef>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    marketplace_usecase
        .unpublish(&course.course_id, &auth.email)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn upvote_course<C, M, N, S>(
    State(marketplace_usecase): State<Arc<MarketplaceUseCase<C, M, N, S>>>,
    _auth: AuthUser,
    Json(course): Json<CourseRef>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    let upvotes = marketplace_usecase.upvote(&course.course_id).await?;
    Ok(Json(UpvoteResponse { upvotes }))
}
