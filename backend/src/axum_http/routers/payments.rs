use crate::usecases::{billing_webhooks::BillingWebhookUseCase, errors::UseCaseError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use crates::domain::repositories::{
    payment_records::PaymentRecordRepository, users::UserRepository,
};
use std::sync::Arc;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes<U, P>(billing_webhook_usecase: Arc<BillingWebhookUseCase<U, P>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/webhook", post(stripe_webhook::<U, P>))
        .with_state(billing_webhook_usecase)
}

/// Unauthenticated; the signature is verified against the raw body.
pub async fn stripe_webhook<U, P>(
    State(billing_webhook_usecase): State<Arc<BillingWebhookUseCase<U, P>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, UseCaseError>
where
    U: UserRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
{
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let receipt = billing_webhook_usecase
        .handle_webhook(&body, signature)
        .await?;

    Ok(Json(receipt))
}
