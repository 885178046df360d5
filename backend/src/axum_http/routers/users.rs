use crate::{
    auth::AuthUser,
    usecases::{entitlements::EntitlementUseCase, errors::UseCaseError},
};
use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use crates::domain::{repositories::users::UserRepository, value_objects::users::UserDto};
use std::sync::Arc;

pub fn routes<U>(entitlements_usecase: Arc<EntitlementUseCase<U>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/me", post(ensure_current_user::<U>))
        .with_state(entitlements_usecase)
}

pub async fn ensure_current_user<U>(
    State(entitlements_usecase): State<Arc<EntitlementUseCase<U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, UseCaseError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let user = entitlements_usecase
        .ensure_user(&auth.email, &auth.user_name)
        .await?;

    Ok(Json(UserDto::from(user)))
}
