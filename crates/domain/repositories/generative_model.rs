use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::generation::{GenerationError, ResponseFormat};

/// A text-in, text-out generative model endpoint.
#[automock]
#[async_trait]
pub trait GenerativeModel {
    async fn generate(
        &self,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, GenerationError>;
}
