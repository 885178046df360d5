use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Rate limits, timeouts, upstream 5xx. Worth retrying.
    #[error("transient generation failure: {0}")]
    Transient(String),
    /// Malformed input or output. Retrying will not help.
    #[error("fatal generation failure: {0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Transient(_))
    }
}
