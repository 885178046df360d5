use axum::http::StatusCode;
use crates::domain::value_objects::generation::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("no credits remaining")]
    EntitlementExhausted { remaining: i32 },

    #[error("generative model unavailable: {0}")]
    ExternalService(String),

    #[error("generated content was unusable: {0}")]
    FatalGeneration(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl UseCaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UseCaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UseCaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UseCaseError::EntitlementExhausted { .. } => StatusCode::PAYMENT_REQUIRED,
            UseCaseError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            UseCaseError::FatalGeneration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UseCaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GenerationError> for UseCaseError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Transient(message) => UseCaseError::ExternalService(message),
            GenerationError::Fatal(message) => UseCaseError::FatalGeneration(message),
        }
    }
}

pub type UseCaseResult<T> = Result<T, UseCaseError>;
