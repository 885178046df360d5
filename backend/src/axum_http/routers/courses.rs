use crate::{
    auth::AuthUser,
    usecases::{courses::CourseUseCase, errors::UseCaseError},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::domain::{
    repositories::{
        chapter_notes::ChapterNotesRepository, courses::CourseRepository,
        study_type_contents::StudyTypeContentRepository, users::UserRepository,
    },
    value_objects::courses::CreateCourseModel,
};
use std::sync::Arc;

pub fn routes<C, N, S, U>(courses_usecase: Arc<CourseUseCase<C, N, S, U>>) -> Router
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/",
            get(list_courses::<C, N, S, U>).post(create_course::<C, N, S, U>),
        )
        .route(
            "/:course_id",
            get(get_course_detail::<C, N, S, U>).delete(delete_course::<C, N, S, U>),
        )
        .with_state(courses_usecase)
}

pub async fn create_course<C, N, S, U>(
    State(courses_usecase): State<Arc<CourseUseCase<C, N, S, U>>>,
    auth: AuthUser,
    Json(create_course_model): Json<CreateCourseModel>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let course = courses_usecase
        .create_course(&auth.email, create_course_model)
        .await?;

    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn list_courses<C, N, S, U>(
    State(courses_usecase): State<Arc<CourseUseCase<C, N, S, U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let courses = courses_usecase.list_by_owner(&auth.email).await?;
    Ok(Json(courses))
}

pub async fn get_course_detail<C, N, S, U>(
    State(courses_usecase): State<Arc<CourseUseCase<C, N, S, U>>>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let detail = courses_usecase
        .get_course_detail(&course_id, &auth.email)
        .await?;
    Ok(Json(detail))
}

pub async fn delete_course<C, N, S, U>(
    State(courses_usecase): State<Arc<CourseUseCase<C, N, S, U>>>,
    auth: AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, UseCaseError>
where
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    courses_usecase.delete_course(&course_id, &auth.email).await?;
    Ok(StatusCode::NO_CONTENT)
}
