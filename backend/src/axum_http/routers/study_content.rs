use crate::{
    auth::AuthUser,
    usecases::{errors::UseCaseError, study_type_contents::StudyTypeContentUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::domain::repositories::{
    courses::CourseRepository, study_type_contents::StudyTypeContentRepository,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyContentRequest {
    #[serde(alias = "study_type", alias = "type")]
    pub study_type: String,
}

#[derive(Debug, Deserialize)]
pub struct StudyContentFilter {
    #[serde(alias = "studyType")]
    pub study_type: Option<String>,
}

/// Mounted under the courses prefix, next to the course routes.
pub fn routes<C, S>(study_content_usecase: Arc<StudyTypeContentUseCase<C, S>>) -> Router
where
    C: CourseRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/:course_id/study-content",
            get(list_study_content::<C, S>).post(request_study_content::<C, S>),
        )
        .with_state(study_content_usecase)
}

pub async fn request_study_content<C, S>(
    State(study_content_usecase): State<Arc<StudyTypeContentUseCase<C, S>>>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Json(request): Json<StudyContentRequest>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    let record = study_content_usecase
        .request_generation(&course_id, &auth.email, &request.study_type)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(record)))
}

pub async fn list_study_content<C, S>(
    State(study_content_usecase): State<Arc<StudyTypeContentUseCase<C, S>>>,
    auth: AuthUser,
    Path(course_id): Path<String>,
    Query(filter): Query<StudyContentFilter>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
{
    let records = study_content_usecase
        .list(&course_id, &auth.email, filter.study_type.as_deref())
        .await?;

    Ok(Json(records))
}
