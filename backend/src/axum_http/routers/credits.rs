use crate::{
    auth::AuthUser,
    usecases::{entitlements::EntitlementUseCase, errors::UseCaseError},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::domain::repositories::users::UserRepository;
use std::sync::Arc;

pub fn routes<U>(entitlements_usecase: Arc<EntitlementUseCase<U>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(get_credit_status::<U>))
        .route("/consume", post(consume_credit::<U>))
        .with_state(entitlements_usecase)
}

pub async fn get_credit_status<U>(
    State(entitlements_usecase): State<Arc<EntitlementUseCase<U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, UseCaseError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let status = entitlements_usecase.get_status(&auth.email).await?;
    Ok(Json(status))
}

/// A denied decision is still a decision: 402 with the same body shape.
pub async fn consume_credit<U>(
    State(entitlements_usecase): State<Arc<EntitlementUseCase<U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, UseCaseError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let decision = entitlements_usecase
        .check_and_consume_credit(&auth.email)
        .await?;
    let status = if decision.granted {
        StatusCode::OK
    } else {
        StatusCode::PAYMENT_REQUIRED
    };

    Ok((status, Json(decision)))
}
